use clap::{Parser, Subcommand};
use dayplan::ClockStyle;

#[derive(Parser, Debug)]
#[command(name = "dayplan", version, about = "Terminal day planner with a timeline view")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a project schedule in the current directory
    Init {
        /// Optional schedule name
        #[arg(long)]
        name: Option<String>,
    },
    /// Add a task to today's schedule
    Add {
        /// Title of the task
        title: String,
        /// Start time, e.g. "9:30 AM" or "14:00"
        #[arg(long, short = 's')]
        start: Option<String>,
        /// Duration in minutes, at most one day
        #[arg(
            long,
            short = 'd',
            default_value_t = 30,
            value_parser = clap::value_parser!(u32).range(1..=1440)
        )]
        duration: u32,
        /// Tags for the task (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
    },
    /// List tasks in start order
    List,
    /// Remove a task
    Remove {
        /// Task id to remove
        task_id: String,
    },
    /// Mark a task as done
    Done {
        /// Task id to complete
        task_id: String,
        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
    },
    /// Print the timeline
    Timeline {
        /// Clock style for labels (12h or 24h)
        #[arg(long)]
        clock: Option<ClockStyle>,
    },
    /// Suggest activities for the free time left today
    Suggest,
    /// Summarize how the day is spent
    Analyze,
    /// Rate how a task went (1 = terrible, 5 = great)
    Mood {
        /// Task id to rate
        task_id: String,
        /// Rating from 1 to 5
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,
    },
    /// Show recorded moods
    Moods,
    /// Manage the to-do list
    Todo {
        #[command(subcommand)]
        action: TodoCommand,
    },
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum TodoCommand {
    /// Add a to-do item
    Add {
        /// Text of the item
        title: String,
    },
    /// List to-do items
    List,
    /// Toggle an item between open and done
    Toggle {
        /// Item id
        id: String,
    },
    /// Remove an item
    Remove {
        /// Item id
        id: String,
    },
    /// Remove every completed item
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_refuses_durations_longer_than_a_day() {
        let parsed = Cli::try_parse_from(["dayplan", "add", "Nap", "-s", "23:00", "-d", "1440"]);
        assert!(matches!(
            parsed.map(|cli| cli.command),
            Ok(Some(Command::Add { duration: 1440, .. }))
        ));
        assert!(Cli::try_parse_from(["dayplan", "add", "x", "-d", "4294967295"]).is_err());
        assert!(Cli::try_parse_from(["dayplan", "add", "x", "-d", "0"]).is_err());
    }
}
