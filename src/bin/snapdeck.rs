use std::path::PathBuf;

use clap::{Parser, Subcommand};

use snapdeck::{
    ClipEncodeConfig, EncodeOutcome, FileSource, MetadataSource as _, RunConfig, WorkItem,
    encode_loop_clip, enumerate_card_backs, enumerate_cards, enumerate_packs, parse_card_backs,
    parse_cards, parse_pack_ids,
};

#[derive(Parser, Debug)]
#[command(name = "snapdeck", version)]
struct Cli {
    /// Run configuration JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enumerate the capture plan and show the resume position.
    Plan(PlanArgs),
    /// Encode an on-disk frame sequence left behind by an interrupted run.
    Encode(EncodeArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[command(subcommand)]
    kind: PlanKind,

    /// Print every work item, not just the counts.
    #[arg(long)]
    items: bool,
}

#[derive(Subcommand, Debug)]
enum PlanKind {
    /// Card stills (locale x finish x layout axes).
    Cards {
        /// Card reference JSON file.
        #[arg(long = "cards")]
        cards_path: PathBuf,
    },
    /// Card backs.
    Backs {
        /// Card-back reference JSON file.
        #[arg(long = "backs")]
        backs_path: PathBuf,
    },
    /// Unopened packs.
    Packs {
        /// Pack enum text file.
        #[arg(long = "packs")]
        packs_path: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Directory holding frame_%04d.png files.
    #[arg(long)]
    frames_dir: PathBuf,

    /// Output clip path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    #[arg(long)]
    frame_count: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RunConfig::from_path(path)?,
        None => RunConfig::default(),
    };

    match cli.cmd {
        Command::Plan(args) => cmd_plan(&config, args),
        Command::Encode(args) => cmd_encode(&config, args),
    }
}

fn cmd_plan(config: &RunConfig, args: PlanArgs) -> anyhow::Result<()> {
    let source = FileSource;
    let items: Vec<WorkItem> = match &args.kind {
        PlanKind::Cards { cards_path } => {
            let json = source.fetch(&cards_path.display().to_string())?;
            let cards = parse_cards(&json)?;
            enumerate_cards(
                &cards,
                &config.locales,
                &config.finishes,
                &config.card_filter(&[]),
            )
        }
        PlanKind::Backs { backs_path } => {
            let json = source.fetch(&backs_path.display().to_string())?;
            let backs = parse_card_backs(&json)?;
            enumerate_card_backs(&backs, config.primary_locale())
        }
        PlanKind::Packs { packs_path } => {
            let text = source.fetch(&packs_path.display().to_string())?;
            let ids = parse_pack_ids(&text);
            enumerate_packs(&ids, &config.pack_ids, config.primary_locale())
        }
    };

    let cursor = config.checkpoint_store().read_cursor()?;
    println!("{} work items, resume cursor {}", items.len(), cursor);
    if cursor as usize >= items.len() && !items.is_empty() {
        println!("nothing left to do");
    }

    if args.items {
        let layout = config.output_layout();
        for (index, item) in items.iter().enumerate() {
            let marker = if (index as u64) < cursor { "done" } else { "todo" };
            println!(
                "{index:6} [{marker}] {} -> {}",
                item.subject,
                layout.still_path(item).display()
            );
        }
    }
    Ok(())
}

fn cmd_encode(config: &RunConfig, args: EncodeArgs) -> anyhow::Result<()> {
    let mut encode = ClipEncodeConfig::new(&args.frames_dir, &args.out, args.fps, args.frame_count);
    encode.ffmpeg = config.ffmpeg.clone();

    match encode_loop_clip(&encode)? {
        EncodeOutcome::Encoded => {
            eprintln!("wrote {}", args.out.display());
            Ok(())
        }
        EncodeOutcome::EncoderMissing => {
            anyhow::bail!("encoder not found; run manually with: {}", encode.manual_command())
        }
        EncodeOutcome::Failed { status } => {
            anyhow::bail!("encoder exited with {status}; frames left in place")
        }
    }
}
