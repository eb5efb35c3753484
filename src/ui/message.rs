use dioxus::{
    logger::tracing::{debug, warn},
    prelude::*,
};

use crate::{
    SharedAssembler,
    blocks::{BlockKind, RenderBlock},
    copy::initialize_code_block_copy_buttons,
    message::{ChatMessage, MessageKind},
    toggle::{ThinkingClickDelegate, ToggleRegistry},
};

#[component]
pub fn MessageView(message: ChatMessage) -> Element {
    let assembler = use_context::<SharedAssembler>();
    let class = match message.kind {
        MessageKind::User => "message human-message",
        MessageKind::Ai => "message ai-message",
    };

    if let Some(error) = message.api_error() {
        return rsx! {
            div { class: "message ai-message error-message",
                div { class: "error-container",
                    span { class: "error-title", "Error" }
                    p { class: "error-text", "{error}" }
                }
            }
        };
    }

    if !message.needs_markdown() {
        return rsx! {
            div { class,
                p { class: "plain-text", "{message.content}" }
            }
        };
    }

    let blocks = assembler
        .borrow_mut()
        .assemble(&message.id, &message.content, message.is_streaming);

    rsx! {
        div { class, "data-message-id": "{message.id}",
            MessageBlocks { message_id: message.id.clone(), blocks, is_streaming: message.is_streaming }
        }
    }
}

#[component]
fn MessageBlocks(message_id: String, blocks: Vec<RenderBlock>, is_streaming: bool) -> Element {
    let mut toggles = use_signal(ThinkingClickDelegate::<ToggleRegistry>::default);
    let mut copy_task = use_signal(|| None::<Task>);

    // Copy buttons are wired once the reply has settled; while streaming the
    // code blocks are still changing under the cursor. A rerender replaces
    // the button handlers, so the listener of the previous render goes too.
    let html: Vec<String> = blocks.iter().map(|b| b.html.clone()).collect();
    use_effect(use_reactive!(|(message_id, html, is_streaming)| {
        if let Some(task) = copy_task.take() {
            task.cancel();
        }
        // Expanding a thinking block remounts its markup and any copy
        // buttons inside it.
        let _ = toggles.read();
        if is_streaming {
            return;
        }
        copy_task.set(Some(spawn(wire_copy_buttons(message_id, html))));
    }));

    rsx! {
        for block in blocks {
            if block.kind == BlockKind::ThinkingComplete {
                div {
                    key: "{block.id}",
                    class: if toggles.read().is_expanded(&block.id) { "thinking-wrapper expanded" } else { "thinking-wrapper" },
                    dangerous_inner_html: block.html_with_expanded(toggles.read().is_expanded(&block.id)).into_owned(),
                    onclick: {
                        let id = block.id.clone();
                        move |_| {
                            if let Some((id, expanded)) = toggles.write().handle_click(Some(&id)) {
                                debug!("thinking block {id} expanded: {expanded}");
                            }
                        }
                    },
                }
            } else {
                div {
                    key: "{block.id}",
                    class: "block-wrapper",
                    dangerous_inner_html: "{block.html}",
                }
            }
        }
    }
}

async fn wire_copy_buttons(message_id: String, html: Vec<String>) {
    let mut buttons = initialize_code_block_copy_buttons(&message_id, html.iter().map(String::as_str), |code, id| {
        let Ok(text) = serde_json::to_string(code) else { return };
        let _ = document::eval(&format!("navigator.clipboard.writeText({text});"));
        debug!("copied code block {id}");
    });
    if buttons.is_empty() {
        return;
    }

    let Ok(selector) = serde_json::to_string(&format!("[data-message-id=\"{message_id}\"]")) else {
        return;
    };
    let Ok(prefix) = serde_json::to_string(&format!("code-{message_id}-")) else {
        return;
    };
    let mut eval = document::eval(&format!(
        r#"
        const root = document.querySelector({selector});
        if (root) {{
            root.querySelectorAll("button.copy-code-button[data-code]").forEach((button, index) => {{
                button.id = {prefix} + index;
                button.onclick = () => {{
                    dioxus.send(index);
                    button.classList.add("copied");
                    setTimeout(() => button.classList.remove("copied"), 2000);
                }};
            }});
        }}
        "#
    ));
    while let Ok(index) = eval.recv::<usize>().await {
        if !buttons.click_id(&format!("code-{message_id}-{index}")) {
            warn!("copy button {index} of message {message_id} is not bound");
        }
    }
}
