//! Streaming preview: step a pasted reply through the renderer chunk by
//! chunk and watch it render block by block.

use dioxus::{logger::tracing::debug, prelude::*};

use crate::{
    markdown::extract_code_blocks,
    message::ChatMessage,
    ui::{chat_input::ChunkInput, message::MessageView},
};

const SAMPLE_REPLY: &str = "<think>\nThe user wants a greeting in Rust.\nA `println!` is enough.\n</think>\n\n\
## Hello\n\nHere you go:\n\n```rust\nfn main() {\n    println!(\"Hello, world!\");\n}\n```\n\n\
> TIP: run it with `cargo run`.\n\nMore at https://doc.rust-lang.org/book/ch01-02-hello-world.html";

#[component]
pub fn Home() -> Element {
    let mut turn = use_signal(|| 1u32);
    let mut reply = use_signal(|| ChatMessage::ai("preview-1", "", true));

    let append = move |chunk: String| {
        reply.with_mut(|m| {
            m.push_chunk(&chunk);
            m.is_streaming = true;
        });
        debug!("appended {} bytes", chunk.len());
    };
    let mut reset = move |content: &str, is_streaming: bool| {
        turn += 1;
        reply.set(ChatMessage::ai(format!("preview-{}", turn()), content, is_streaming));
    };

    let message = reply();
    let snippets = extract_code_blocks(&message.content).len();
    let status = if message.is_streaming { "streaming" } else { "complete" };

    rsx! {
        div { class: "preview",
            div { class: "preview-toolbar",
                span { class: "preview-status", "{status} · {message.content.len()} bytes · {snippets} code blocks" }
                button {
                    disabled: !message.is_streaming,
                    onclick: move |_| reply.with_mut(|m| m.is_streaming = false),
                    "Finish"
                }
                button { onclick: move |_| reset("", true), "Clear" }
                button { onclick: move |_| reset(SAMPLE_REPLY, false), "Sample" }
            }
            div { class: "chat",
                if !message.content.is_empty() {
                    MessageView { message: message.clone() }
                }
            }
            ChunkInput {
                disabled: !message.is_streaming,
                on_chunk: append,
                on_finish: move |_| reply.with_mut(|m| m.is_streaming = false),
            }
        }
    }
}
