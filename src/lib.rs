//! Incremental rendering of streamed chat replies.
//!
//! A reply buffer goes in with its message id and streaming flag; an ordered
//! list of sanitized HTML blocks comes out, with `<think>` reasoning split
//! into its own collapsible blocks. See [`blocks::BlockAssembler`].

pub mod app_settings;
pub mod blocks;
pub mod cache;
pub mod copy;
pub mod error;
pub mod markdown;
pub mod message;
#[cfg(not(target_arch = "wasm32"))]
pub mod storage;
pub mod thinking;
pub mod toggle;

#[cfg(feature = "ui")]
pub mod ui;

pub use app_settings::RenderSettings;
pub use blocks::{BlockAssembler, BlockKind, RenderBlock, RenderUpdate};
pub use error::RenderError;
pub use message::{ChatMessage, MessageKind};

#[cfg(feature = "ui")]
pub use app::App;

#[cfg(feature = "ui")]
mod app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use dioxus::prelude::*;

    use crate::RenderSettings;
    use crate::blocks::BlockAssembler;
    use crate::ui::home::Home;
    use crate::ui::settings::Settings;

    const FAVICON: Asset = asset!("/assets/favicon.svg");
    const MAIN_CSS: Asset = asset!("/assets/main.css");

    /// Shared by every message view so the render caches span the whole
    /// conversation.
    pub type SharedAssembler = Rc<RefCell<BlockAssembler>>;

    #[component]
    pub fn App() -> Element {
        let init = use_resource(|| async { crate::ui::load_settings().await });
        rsx! {
            document::Link { rel: "icon", href: FAVICON }
            document::Link { rel: "stylesheet", href: MAIN_CSS }
            match init() {
                None => rsx! { "Loading..." },
                Some(settings) => rsx! { Renderer { settings } },
            }
        }
    }

    #[component]
    fn Renderer(settings: RenderSettings) -> Element {
        use_context_provider(|| Signal::new(settings.clone()));
        use_context_provider(|| -> SharedAssembler { Rc::new(RefCell::new(BlockAssembler::new(settings.clone()))) });
        rsx! {
            Router::<Route> {}
        }
    }

    #[derive(Debug, Clone, Routable, PartialEq)]
    #[rustfmt::skip]
    enum Route {
        #[layout(Layout)]
        #[route("/")]
        Home {},
        #[route("/settings")]
        Settings { },
        #[route("/:..segments")]
        PageNotFound { segments: Vec<String> },
    }

    /// Shared layout component.
    #[component]
    fn Layout() -> Element {
        rsx! {
            nav { class: "top-nav",
                Link { to: Route::Home {}, "Preview" }
                Link { to: Route::Settings {}, "Settings" }
            }
            Outlet::<Route> {}
        }
    }

    #[component]
    fn PageNotFound(segments: Vec<String>) -> Element {
        rsx! {
            "Could not find the page you are looking for."
            Link { to: Route::Home {}, "Go To Home" }
        }
    }
}

#[cfg(feature = "ui")]
pub use app::SharedAssembler;
