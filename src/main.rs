use dioxus::logger::tracing::Level;

use lumo_chat::App;

fn main() {
    if let Err(e) = dioxus::logger::init(Level::WARN) {
        eprintln!("failed to initialise logging: {e}");
    }
    dioxus::launch(App);
}
