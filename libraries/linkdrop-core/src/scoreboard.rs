//! Scoreboard rendering for the `/scoreboard` command and CLI.

use crate::types::ContributionRecord;
use std::fmt::Write;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Render ranked records as chat-ready lines, one per user
///
/// Records are expected in ledger order (highest count first). The first three
/// ranks get medals, the rest are numbered.
pub fn render_scoreboard(records: &[ContributionRecord]) -> String {
    if records.is_empty() {
        return "No tracks contributed yet. Drop a link to get on the board!".to_string();
    }

    let mut out = String::from("**Top contributors**\n");
    for (index, record) in records.iter().enumerate() {
        let rank = match MEDALS.get(index) {
            Some(medal) => (*medal).to_string(),
            None => format!("{}.", index + 1),
        };
        let noun = if record.count == 1 { "track" } else { "tracks" };
        // Writing to a String cannot fail
        let _ = writeln!(out, "{rank} <@{}>: {} {noun}", record.user_id, record.count);
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn record(user: &str, count: u64) -> ContributionRecord {
        ContributionRecord::new(UserId::new(user), count)
    }

    #[test]
    fn empty_board_has_a_friendly_message() {
        assert!(render_scoreboard(&[]).starts_with("No tracks contributed yet"));
    }

    #[test]
    fn first_three_get_medals() {
        let board = render_scoreboard(&[
            record("1", 12),
            record("2", 7),
            record("3", 1),
            record("4", 1),
        ]);
        let lines: Vec<&str> = board.lines().collect();

        assert_eq!(lines[0], "**Top contributors**");
        assert_eq!(lines[1], "🥇 <@1>: 12 tracks");
        assert_eq!(lines[2], "🥈 <@2>: 7 tracks");
        assert_eq!(lines[3], "🥉 <@3>: 1 track");
        assert_eq!(lines[4], "4. <@4>: 1 track");
        assert_eq!(lines.len(), 5);
    }
}
