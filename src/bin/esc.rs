extern crate escala as lib;

use chrono::{Local, NaiveDate};
use flexi_logger::{FileSpec, Logger};
use lib::calendar::MonthIndex;
use lib::config::Config;
use lib::context::Context;
use lib::notes::{FileStore, NoteStore};
use lib::render::MonthPane;
use lib::schedule::ScheduleType;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "esc",
    about = "Escala - rotating shift calendar with notes per day."
)]
pub struct Args {
    #[structopt(
        name = "CONFIG",
        short = "c",
        long = "config",
        help = "path to config file",
        parse(from_os_str)
    )]
    pub configfile: Option<PathBuf>,

    #[structopt(long = "log-file", help = "path to log file", parse(from_os_str))]
    pub log_file: Option<PathBuf>,

    #[structopt(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Debug, Default, StructOpt)]
pub struct Selection {
    #[structopt(
        short = "s",
        long = "schedule",
        help = "schedule number (1-4) or name, e.g. 4X1X3"
    )]
    pub schedule: Option<ScheduleType>,

    #[structopt(short = "r", long = "rotation", help = "rotation label or its number")]
    pub rotation: Option<String>,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    #[structopt(about = "print a month")]
    Show {
        #[structopt(short = "m", long = "month", help = "month as YYYY-MM")]
        month: Option<MonthIndex>,

        #[structopt(long = "color", help = "paint days with their situation colour")]
        color: bool,

        #[structopt(flatten)]
        selection: Selection,
    },
    #[structopt(about = "print the situation of a day")]
    Situation {
        #[structopt(help = "day as YYYY-MM-DD")]
        date: NaiveDate,

        #[structopt(flatten)]
        selection: Selection,
    },
    #[structopt(about = "read or change the note of a day")]
    Note {
        #[structopt(subcommand)]
        cmd: NoteCommand,
    },
}

#[derive(Debug, StructOpt)]
pub enum NoteCommand {
    Get {
        date: NaiveDate,

        #[structopt(flatten)]
        selection: Selection,
    },
    Set {
        date: NaiveDate,

        #[structopt(required = true)]
        text: Vec<String>,

        #[structopt(flatten)]
        selection: Selection,
    },
    Clear {
        date: NaiveDate,

        #[structopt(flatten)]
        selection: Selection,
    },
}

fn context_for(
    config: &Config,
    selection: &Selection,
    today: NaiveDate,
) -> Result<Context, Box<dyn std::error::Error>> {
    let mut context = Context::from_config(config, today);

    if let Some(schedule) = selection.schedule {
        context.select_schedule(schedule);
    }

    if let Some(rotation) = &selection.rotation {
        let index = rotation
            .parse::<usize>()
            .ok()
            .or_else(|| context.schedule().table().rotation_index(rotation))
            .unwrap_or(0);
        context.select_rotation(index)?;
    }

    Ok(context)
}

fn run_note_command(
    cmd: NoteCommand,
    config: &Config,
    notes: &NoteStore<FileStore>,
    today: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        NoteCommand::Get { date, selection } => {
            let context = context_for(config, &selection, today)?;
            if let Some(text) = notes.lookup(&context.note_key(date)) {
                println!("{}", text);
            }
        }
        NoteCommand::Set {
            date,
            text,
            selection,
        } => {
            let context = context_for(config, &selection, today)?;
            notes.save(&context.note_key(date), &text.join(" "))?;
        }
        NoteCommand::Clear { date, selection } => {
            let context = context_for(config, &selection, today)?;
            notes.clear(&context.note_key(date))?;
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_args();

    const DEFAULT_LOG_LEVEL: &str = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let mut logger = Logger::try_with_env_or_str(DEFAULT_LOG_LEVEL)?;

    if let Some(log_file) = args.log_file {
        logger = logger
            .log_to_file(FileSpec::try_from(log_file)?)
            .print_message();
    }

    logger.start()?;

    std::panic::set_hook(Box::new(move |info| {
        println!("Escala ran into a fatal error!");
        println!("Consider filing an issue with a log file and the backtrace below.");

        println!("{}", info);
        println!("{:?}", backtrace::Backtrace::new());
    }));

    lib::schedule::validate_tables()?;

    let config = lib::config::load_suitable_config(args.configfile.as_deref())?;
    let notes = NoteStore::load_with_key(
        FileStore::new(&config.data_dir())?,
        &config.storage_key,
    );
    let today = Local::now().date_naive();

    match args.cmd.unwrap_or(Command::Show {
        month: None,
        color: false,
        selection: Selection::default(),
    }) {
        Command::Show {
            month,
            color,
            selection,
        } => {
            let mut context = context_for(&config, &selection, today)?;
            if let Some(month) = month {
                context.select_month(month);
            }

            let snapshot = notes.snapshot();
            let view = context.month_view(context.month(), &snapshot);
            print!("{}", MonthPane::new(&context, &view).colored(color));
        }
        Command::Situation { date, selection } => {
            let context = context_for(&config, &selection, today)?;
            let day = context.day_view(date, &notes.snapshot());

            match (day.offset, day.situation) {
                (Some(offset), Some(situation)) => println!(
                    "{} {} {}: {} (day {} of {})",
                    date,
                    context.schedule(),
                    context.rotation_label(),
                    situation,
                    offset + 1,
                    context.schedule().table().rotation_length
                ),
                _ => println!("{}: unknown", date),
            }
        }
        Command::Note { cmd } => run_note_command(cmd, &config, &notes, today)?,
    }

    Ok(())
}
