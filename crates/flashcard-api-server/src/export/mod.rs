//! Serialization of the ordered card list to the two download formats.

use crate::models::cards::Card;
use crate::utils::error::ApiError;

/// CSV with a `front,back` header and standard quoting, so embedded commas,
/// quotes and newlines survive a round trip through any CSV reader.
pub fn to_csv(cards: &[Card]) -> Result<String, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["front", "back"])
        .map_err(|e| ApiError::InternalError(format!("CSV write failed: {}", e)))?;

    for card in cards {
        writer
            .write_record([card.front.as_str(), card.back.as_str()])
            .map_err(|e| ApiError::InternalError(format!("CSV write failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::InternalError(format!("CSV flush failed: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| ApiError::InternalError(format!("CSV encoding: {}", e)))
}

/// Anki importable text: one `front<TAB>back` line per card, no header.
/// The format has no quoting, so tabs and newlines inside a side are
/// flattened to spaces. Sides free of those characters round-trip exactly.
pub fn to_anki_txt(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| format!("{}\t{}", flatten(&card.front), flatten(&card.back)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn flatten(side: &str) -> String {
    side.replace(['\t', '\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(front: &str, back: &str) -> Card {
        Card {
            front: front.to_string(),
            back: back.to_string(),
            source_chunk: 0,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_card() {
        let cards = vec![card("q1", "a1"), card("q2", "a2")];
        let out = to_csv(&cards).unwrap();
        assert_eq!(out, "front,back\nq1,a1\nq2,a2\n");
    }

    #[test]
    fn csv_round_trips_awkward_content() {
        let cards = vec![
            card("what, exactly, is \"ownership\"?", "a set of rules\nchecked at compile time"),
            card("plain question", "plain answer"),
        ];

        let out = to_csv(&cards).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers, &csv::StringRecord::from(vec!["front", "back"]));

        let rows: Vec<(String, String)> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_string(), r[1].to_string())
            })
            .collect();

        let expected: Vec<(String, String)> = cards
            .iter()
            .map(|c| (c.front.clone(), c.back.clone()))
            .collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn anki_txt_is_tab_separated_without_header() {
        let cards = vec![card("q1", "a1"), card("q2", "a2")];
        assert_eq!(to_anki_txt(&cards), "q1\ta1\nq2\ta2");
    }

    #[test]
    fn anki_round_trips_tab_free_cards() {
        let cards = vec![
            card("what is ownership?", "a set of rules, checked at compile time"),
            card("what is borrowing?", "taking a reference without ownership"),
        ];

        let out = to_anki_txt(&cards);
        let rows: Vec<(String, String)> = out
            .lines()
            .map(|line| {
                let (q, a) = line.split_once('\t').unwrap();
                (q.to_string(), a.to_string())
            })
            .collect();

        let expected: Vec<(String, String)> = cards
            .iter()
            .map(|c| (c.front.clone(), c.back.clone()))
            .collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn anki_flattens_tabs_and_newlines() {
        let cards = vec![card("has\ttab", "has\nnewline")];
        assert_eq!(to_anki_txt(&cards), "has tab\thas newline");
    }

    #[test]
    fn empty_card_list_serializes_to_header_only_or_nothing() {
        assert_eq!(to_csv(&[]).unwrap(), "front,back\n");
        assert_eq!(to_anki_txt(&[]), "");
    }
}
