// src/notify/mod.rs
//! Turns new offers into channel announcements.

use chrono::{TimeZone, Utc};
use metrics::counter;

use crate::chat::{
    ChannelId, ChatPlatform, Embed, EmbedField, EmbedImage, OutgoingMessage, Role,
};
use crate::ingest::types::OfferRecord;

/// discord.Color.green()
pub const EMBED_COLOR_GREEN: u32 = 0x2E_CC_71;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnounceReport {
    pub sent: usize,
    pub failed: usize,
}

/// `%Y-%m-%d %H:%M UTC`, or `None` for timestamps chrono cannot represent.
pub fn format_offer_end(unix_secs: i64) -> Option<String> {
    Utc.timestamp_opt(unix_secs, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
}

pub fn render_offer(offer: &OfferRecord, role: &Role) -> OutgoingMessage {
    let mut fields = Vec::with_capacity(2);
    if let Some(end) = offer.discount_end.and_then(format_offer_end) {
        fields.push(EmbedField {
            name: "Offer Ends".to_string(),
            value: end,
            inline: false,
        });
    }
    fields.push(EmbedField {
        name: "Store Page".to_string(),
        value: format!("[Click here]({})", offer.store_url),
        inline: false,
    });

    OutgoingMessage {
        content: format!("Hey {}, a new free game is available!", role.mention()),
        embed: Some(Embed {
            title: offer.name.clone(),
            description: format!(
                "{}\nOriginal Price: ${:.2}",
                offer.status, offer.original_price
            ),
            url: Some(offer.store_url.clone()),
            color: Some(EMBED_COLOR_GREEN),
            thumbnail: offer.image_url.clone().map(|url| EmbedImage { url }),
            fields,
        }),
    }
}

/// Sends one message per offer. A failed send is logged and skipped.
pub async fn announce(
    platform: &dyn ChatPlatform,
    channel: ChannelId,
    role: &Role,
    offers: &[OfferRecord],
) -> AnnounceReport {
    let mut report = AnnounceReport::default();
    for offer in offers {
        let msg = render_offer(offer, role);
        match platform.send_message(channel, &msg).await {
            Ok(()) => {
                report.sent += 1;
                counter!("notify_sent_total").increment(1);
                tracing::info!(offer = %offer.name, "notified about new free game");
            }
            Err(e) => {
                report.failed += 1;
                counter!("notify_failed_total").increment(1);
                tracing::error!(offer = %offer.name, error = %e, "sending notification failed");
            }
        }
    }
    report
}
