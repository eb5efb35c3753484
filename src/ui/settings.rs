// Copyright © 2025 Nipun Kumar

use dioxus::{logger::tracing::warn, prelude::*};

use crate::{RenderSettings, SharedAssembler, blocks::BlockAssembler};

#[derive(Props, Clone, PartialEq)]
pub struct SettingsProps {
    pub on_close: Option<EventHandler<()>>,
}

#[allow(non_snake_case)]
#[component]
pub fn Settings(props: SettingsProps) -> Element {
    let mut settings_ctx = use_context::<Signal<RenderSettings>>();
    let assembler = use_context::<SharedAssembler>();
    let mut draft = use_signal(|| settings_ctx());

    let save = move |_| {
        let s = draft();
        settings_ctx.set(s.clone());
        // New capacities and render options only apply to a fresh assembler.
        *assembler.borrow_mut() = BlockAssembler::new(s.clone());
        spawn(async move {
            crate::ui::save_settings(&s).await;
        });
    };

    let number = move |label: &'static str, value: usize, apply: fn(&mut RenderSettings, usize)| {
        rsx! {
            label { class: "settings-row",
                span { "{label}" }
                input {
                    r#type: "number",
                    min: "0",
                    value: "{value}",
                    oninput: move |e: Event<FormData>| match e.value().parse::<usize>() {
                        Ok(n) => draft.with_mut(|s| apply(s, n)),
                        Err(err) => warn!("Ignoring {label} value: {err}"),
                    },
                }
            }
        }
    };
    let flag = move |label: &'static str, value: bool, apply: fn(&mut RenderSettings, bool)| {
        rsx! {
            label { class: "settings-row",
                span { "{label}" }
                input {
                    r#type: "checkbox",
                    checked: value,
                    onchange: move |e: Event<FormData>| draft.with_mut(|s| apply(s, e.checked())),
                }
            }
        }
    };

    let s = draft();
    rsx! {
        div { class: "settings",
            div { class: "settings-header",
                h3 { "Render settings" }
                if let Some(on_close) = props.on_close {
                    button { onclick: move |_| on_close.call(()), "×" }
                }
            }
            hr {}
            {number("Cached documents", s.document_cache_capacity, |s, n| s.document_cache_capacity = n)}
            {number("Cached blocks", s.block_cache_capacity, |s, n| s.block_cache_capacity = n)}
            {number("Medium code block after (lines)", s.code_block.medium_lines, |s, n| s.code_block.medium_lines = n)}
            {number("Large code block after (lines)", s.code_block.large_lines, |s, n| s.code_block.large_lines = n)}
            {number("Link path length", s.link_path_max_chars, |s, n| s.link_path_max_chars = n)}
            {flag("Ignore think tags in code fences", s.protect_fenced_code, |s, b| s.protect_fenced_code = b)}
            {flag("Smart punctuation", s.smart_punctuation, |s, b| s.smart_punctuation = b)}
            {flag("Line breaks on single newlines", s.hard_breaks, |s, b| s.hard_breaks = b)}
            hr {}
            div { class: "settings-actions",
                button { onclick: move |_| draft.set(RenderSettings::default()), "Defaults" }
                button { onclick: save, "Save" }
            }
        }
    }
}
