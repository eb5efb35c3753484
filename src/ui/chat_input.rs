use std::rc::Rc;

use dioxus::prelude::*;

const SEND_ICON: Asset = asset!("/assets/send.svg");

/// Splits off the first `max_chars` characters of `text`. A size of zero
/// takes everything.
pub fn next_chunk(text: &str, max_chars: usize) -> (&str, &str) {
    if max_chars == 0 {
        return (text, "");
    }
    match text.char_indices().nth(max_chars) {
        Some((at, _)) => text.split_at(at),
        None => (text, ""),
    }
}

/// Holds pending reply text and feeds it to `on_chunk` a slice at a time,
/// so a pasted reply can be stepped through the way a model streams it.
/// `on_finish` ends the reply once nothing is left.
#[component]
pub fn ChunkInput(disabled: bool, on_chunk: Callback<String, ()>, on_finish: Callback<(), ()>) -> Element {
    let mut pending = use_signal(String::new);
    let mut chunk_chars = use_signal(|| 16usize);

    let mut step = move || {
        if disabled || pending.read().is_empty() {
            return;
        }
        let (chunk, rest) = {
            let text = pending.read();
            let (chunk, rest) = next_chunk(&text, chunk_chars());
            (chunk.to_string(), rest.to_string())
        };
        on_chunk(chunk);
        pending.set(rest);
    };
    let mut flush = move || {
        if disabled {
            return;
        }
        let text = pending.take();
        if !text.is_empty() {
            on_chunk(text);
        }
        on_finish(());
    };

    let disabled = if disabled { Some(true) } else { None };
    rsx! {
        div { class: "chunk-input",
            textarea {
                placeholder: "Paste a reply, e.g. <think>Let me see</think>**Done**",
                disabled,
                oninput: move |e: Event<FormData>| pending.set(e.value()),
                onkeypress: move |e: Event<KeyboardData>| {
                    let k: Rc<KeyboardData> = e.data;
                    if k.code() == Code::Enter && k.modifiers().ctrl() {
                        if k.modifiers().shift() {
                            flush();
                        } else {
                            step();
                        }
                    }
                },
                value: pending,
            }
            div { class: "chunk-controls",
                label {
                    "Chunk size"
                    input {
                        r#type: "number",
                        min: "0",
                        value: "{chunk_chars}",
                        oninput: move |e: Event<FormData>| {
                            if let Ok(n) = e.value().parse::<usize>() {
                                chunk_chars.set(n);
                            }
                        },
                    }
                }
                button { title: "Send next chunk (Ctrl+Enter)", onclick: move |_| step(), disabled,
                    img { src: SEND_ICON }
                }
                button { title: "Send the rest and finish (Ctrl+Shift+Enter)", onclick: move |_| flush(), disabled,
                    "Finish"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_split_on_char_boundaries() {
        assert_eq!(next_chunk("héllo wörld", 4), ("héll", "o wörld"));
        assert_eq!(next_chunk("<think>", 3), ("<th", "ink>"));
        assert_eq!(next_chunk("abc", 10), ("abc", ""));
        assert_eq!(next_chunk("abc", 0), ("abc", ""));
        assert_eq!(next_chunk("", 4), ("", ""));
    }
}
