use std::collections::HashSet;

use rs_chatscrape::{scrape, ExtractionStage, Options};

fn gallery(count: usize) -> String {
    let imgs: String = (0..count)
        .map(|i| format!(r#"<img src="/files/photo-{i}.jpg" width="256" height="256">"#))
        .collect();
    format!(
        r#"<body>
            <div data-message-author-role="user">Show me some photos</div>
            <div data-message-author-role="assistant">Here they are {imgs}
                <img src="/files/photo-0.jpg" width="256" height="256">
                <img src="/avatars/bot.png" width="32" height="32">
            </div>
        </body>"#
    )
}

fn image_opts() -> Options {
    Options {
        include_images: true,
        ..Options::default().with_url("https://chatgpt.com/c/photos")
    }
}

#[test]
fn image_list_is_capped_ordered_and_unique() {
    let outcome = scrape(&gallery(15), &image_opts());
    let content = outcome.content().unwrap();

    assert_eq!(content.images.len(), 10);
    let expected: Vec<String> = (0..10)
        .map(|i| format!("https://chatgpt.com/files/photo-{i}.jpg"))
        .collect();
    assert_eq!(content.images, expected);

    let unique: HashSet<&String> = content.images.iter().collect();
    assert_eq!(unique.len(), content.images.len());
}

#[test]
fn custom_cap() {
    let opts = Options {
        max_images: 3,
        ..image_opts()
    };
    let outcome = scrape(&gallery(15), &opts);
    assert_eq!(outcome.content().unwrap().images.len(), 3);
}

#[test]
fn placeholders_skip_avatars() {
    let outcome = scrape(&gallery(2), &image_opts());
    let content = outcome.content().unwrap();
    let answer = &content.conversation[1].content;

    assert!(answer.starts_with("Here they are"));
    assert!(answer.contains("[Image: photo-0.jpg]"));
    assert!(answer.contains("[Image: photo-1.jpg]"));
    assert!(!answer.contains("bot.png"));
    assert!(!content.images.iter().any(|src| src.contains("avatars")));
}

#[test]
fn images_off_by_default() {
    let outcome = scrape(&gallery(5), &Options::default().with_url("https://chatgpt.com/c/photos"));
    let content = outcome.content().unwrap();
    assert!(content.images.is_empty());
    assert_eq!(content.conversation[1].content, "Here they are");
}

#[test]
fn image_only_message_is_kept() {
    let html = r#"<body>
        <div data-message-author-role="user"><img src="https://cdn.example.com/upload/scan.png" alt="Scanned receipt"></div>
        <div data-message-author-role="assistant">The total on the receipt is 42 dollars.</div>
    </body>"#;
    let outcome = scrape(html, &image_opts());
    let content = outcome.content().unwrap();
    assert_eq!(content.extraction_stage, ExtractionStage::Structured);
    assert_eq!(content.conversation[0].content, "[Image: Scanned receipt]");
    assert_eq!(content.images, vec!["https://cdn.example.com/upload/scan.png"]);
}

#[test]
fn fallback_stages_collect_from_the_page() {
    let html = r#"<body>
        <p>The architecture diagram below shows how requests flow through the gateway.</p>
        <p>Each service publishes events that the aggregator consumes asynchronously.</p>
        <img src="diagram.svg" width="640" height="480">
    </body>"#;
    let opts = Options {
        include_images: true,
        ..Options::default().with_url("https://example.com/chat/")
    };
    let outcome = scrape(html, &opts);
    let content = outcome.content().unwrap();
    assert_eq!(content.extraction_stage, ExtractionStage::BlockElements);
    assert_eq!(content.images, vec!["https://example.com/chat/diagram.svg"]);
}
