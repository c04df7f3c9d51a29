use std::io::Write;

use crate::{session::StoredSession, util::format_clock};

const HEADER: [&str; 6] = [
    "id",
    "started_at",
    "ended_at",
    "duration_seconds",
    "note",
    "annotations",
];

/// Annotations flattened into one cell: `MM:SS text; MM:SS text`
fn annotations_cell(session: &StoredSession) -> String {
    session
        .annotations
        .iter()
        .map(|a| format!("{} {}", format_clock(a.offset_seconds), a.text))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Write the journal as CSV with a header row, one record per session.
pub fn write_csv<W: Write>(sessions: &[StoredSession], writer: W) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;
    for s in sessions {
        out.write_record([
            s.id.clone(),
            s.started_at.to_rfc3339(),
            s.ended_at.to_rfc3339(),
            s.duration_seconds.to_string(),
            s.note.clone(),
            annotations_cell(s),
        ])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Annotation;
    use chrono::DateTime;

    fn session() -> StoredSession {
        let started_at = DateTime::parse_from_rfc3339("2024-03-09T09:00:00+01:00").unwrap();
        StoredSession {
            id: "abc".into(),
            started_at,
            ended_at: started_at + chrono::Duration::seconds(10),
            duration_seconds: 10,
            note: "focused, mostly".into(),
            annotations: vec![
                Annotation::new(5, "check email"),
                Annotation::new(8, "stretch"),
            ],
        }
    }

    #[test]
    fn writes_header_and_quoted_rows() {
        let mut buf = Vec::new();
        write_csv(&[session()], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,started_at,ended_at,duration_seconds,note,annotations")
        );
        assert_eq!(
            lines.next(),
            Some(
                "abc,2024-03-09T09:00:00+01:00,2024-03-09T09:00:10+01:00,10,\"focused, mostly\",00:05 check email; 00:08 stretch"
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_journal_is_just_the_header() {
        let mut buf = Vec::new();
        write_csv(&[], &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "id,started_at,ended_at,duration_seconds,note,annotations\n"
        );
    }
}
