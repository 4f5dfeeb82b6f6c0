use crate::moderation::notifier::{LogRecord, COLOUR_ERROR, COLOUR_INFO, COLOUR_SUCCESS};
use serenity::builder::CreateEmbed;
use serenity::model::prelude::Timestamp;
use serenity::utils::Colour;

pub const FOOTER: &str = "AutoBanNet";

pub fn render<'a>(e: &'a mut CreateEmbed, record: &LogRecord) -> &'a mut CreateEmbed {
    e.title(&record.title)
        .colour(Colour::new(record.colour))
        .footer(|f| f.text(FOOTER))
        .timestamp(Timestamp::now());
    if let Some(description) = &record.description {
        e.description(description);
    }
    for field in &record.fields {
        e.field(&field.name, &field.value, field.inline);
    }
    e
}

pub fn success(title: &str, description: impl Into<String>) -> LogRecord {
    LogRecord::notice(title, description).with_colour(COLOUR_SUCCESS)
}

pub fn info(title: &str, description: impl Into<String>) -> LogRecord {
    LogRecord::notice(title, description).with_colour(COLOUR_INFO)
}

pub fn error(title: &str, description: impl Into<String>) -> LogRecord {
    LogRecord::notice(title, description).with_colour(COLOUR_ERROR)
}
