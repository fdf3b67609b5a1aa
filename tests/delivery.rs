use std::path::PathBuf;

use cardcanvas::delivery::{DeliveryTarget, DirectoryDelivery, MemoryDelivery};
use cardcanvas::rendering::{BlockLayout, UnsupportedRasterizer};
use cardcanvas::{
    Attachment, AttachmentDelivery, Canvas, InteractionHandle, MessageHandle, OutputFormat,
    RenderOptions, RenderRequest,
};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cardcanvas-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Adapters are used through the trait object, as bots hold them.
async fn post(delivery: &dyn AttachmentDelivery, bytes: Vec<u8>) -> cardcanvas::Result<()> {
    delivery
        .send_image_to_channel("cards", Attachment::new(bytes.clone()).with_filename("rank.svg"))
        .await?;
    delivery
        .send_image_as_attachment(&InteractionHandle::new("cmd-1", "cards"), Attachment::new(bytes))
        .await
}

#[tokio::test]
async fn rendered_card_is_delivered_to_directory() {
    let canvas = Canvas::with_backends(RenderOptions::default(), BlockLayout::default(), UnsupportedRasterizer);
    let svg = canvas
        .render(
            "<div><h1>Rank #1</h1></div>",
            &RenderRequest {
                format: Some(OutputFormat::Svg),
                ..Default::default()
            },
        )
        .unwrap();

    let root = scratch("dir");
    let delivery = DirectoryDelivery::new(&root);
    post(&delivery, svg.as_bytes().to_vec()).await.unwrap();

    let written = std::fs::read_to_string(root.join("cards/rank.svg")).unwrap();
    assert!(written.contains("Rank #1"));
    assert!(root.join("cards/interactions/cmd-1-image.png").exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn memory_delivery_through_trait_object() {
    let delivery = MemoryDelivery::new();
    post(&delivery, vec![9, 9]).await.unwrap();

    let sent = delivery.deliveries();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].attachment.filename, "rank.svg");
    assert_eq!(sent[1].target, DeliveryTarget::Interaction("cmd-1".into()));
    assert_eq!(sent[1].attachment.filename, "image.png");
}

#[tokio::test]
async fn reply_refusals_are_delivery_errors() {
    let root = scratch("refuse");
    let delivery = DirectoryDelivery::new(&root);

    let msg = MessageHandle {
        can_reply: false,
        ..MessageHandle::new("m", "cards")
    };
    let err = delivery
        .reply_with_image(&msg, Attachment::new(vec![1]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Attachment delivery failed: Message does not support reply");

    let inter = InteractionHandle {
        can_reply: false,
        ..InteractionHandle::new("i", "cards")
    };
    let err = delivery
        .send_image_as_attachment(&inter, Attachment::new(vec![1]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Attachment delivery failed: Interaction does not support reply");
    assert!(!root.exists());
}
