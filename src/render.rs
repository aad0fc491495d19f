use crate::filter::{FilterMap, Token};
use crate::message::ConsumedMessage;
use chrono::SecondsFormat;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::io::{self, Write};

/// Erase the display and move the cursor home
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Create a table with the shared rounded style and bold headers
pub fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

/// Build the Field/Value table shown for one message
pub fn message_table(msg: &ConsumedMessage) -> Table {
    let mut table = create_styled_table(&["Field", "Value"]);
    table.add_row(vec!["Topic".to_string(), msg.topic.clone()]);
    table.add_row(vec!["Partition".to_string(), msg.partition.to_string()]);
    table.add_row(vec!["Offset".to_string(), msg.offset.to_string()]);

    if let Some(ts) = msg.timestamp {
        table.add_row(vec![
            "Timestamp (UTC)".to_string(),
            ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        ]);
    }
    if !msg.headers.is_empty() {
        table.add_row(vec!["Headers".to_string(), msg.headers.join(", ")]);
    }

    table.add_row(vec!["Value".to_string(), msg.body().to_string()]);
    table
}

pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    out.write_all(CLEAR_SCREEN.as_bytes())?;
    out.flush()
}

pub fn print_message(msg: &ConsumedMessage) {
    println!("{}", "Kafka Message".yellow().bold());
    println!("{}", message_table(msg));
}

/// Build a Key/Value table for a parsed filter
pub fn filter_table(required: &FilterMap) -> Table {
    let mut table = create_styled_table(&["Key", "Value"]);
    for (key, value) in required.iter() {
        table.add_row(vec![key, value]);
    }
    table
}

/// One line per token, in `Type('value')@position` form
pub fn token_lines(tokens: &[Token]) -> String {
    tokens.iter().map(|t| format!("  {t}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{parse, tokenize};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_message_table_optional_rows() {
        let msg = ConsumedMessage::new("orders", 7, "status=ok");
        let rendered = message_table(&msg).to_string();
        assert!(rendered.contains("orders"));
        assert!(rendered.contains("status=ok"));
        assert!(!rendered.contains("Timestamp (UTC)"));
        assert!(!rendered.contains("Headers"));
    }

    #[test]
    fn test_message_table_with_metadata() {
        let mut msg = ConsumedMessage::new("orders", 7, "status=ok");
        msg.timestamp = Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
        msg.headers = vec!["trace".to_string(), "source".to_string()];

        let rendered = message_table(&msg).to_string();
        assert!(rendered.contains("2026-01-02T03:04:05.000Z"));
        assert!(rendered.contains("trace, source"));
    }

    #[test]
    fn test_filter_table_lists_pairs() {
        let rendered = filter_table(&parse("region=eu, tier='gold'")).to_string();
        assert!(rendered.contains("region"));
        assert!(rendered.contains("gold"));
        assert!(!rendered.contains("'gold'"));
    }

    #[test]
    fn test_clear_screen_writes_escape_sequence() {
        let mut out = Vec::new();
        clear_screen(&mut out).unwrap();
        assert_eq!(out, b"\x1B[2J\x1B[1;1H");
    }

    #[test]
    fn test_token_lines() {
        let text = token_lines(&tokenize("a=1"));
        assert_eq!(
            text,
            "  PropertyName('a')@0\n  Equals('=')@1\n  PropertyValue('1')@2\n  EOF('')@3\n"
        );
    }
}
