//! `cardcanvas` command line: render markup files or built-in cards.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};

use cardcanvas::templates::{self, LevelUpData, RankCardData, WelcomeCardData};
use cardcanvas::{
    Canvas, FontEntry, FontStyle, FontWeight, OutputFormat, RenderOptions, RenderRequest,
};

#[derive(Parser, Debug)]
#[command(name = "cardcanvas", version, about = "Render HTML-subset cards to PNG or SVG")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a markup file (`-` reads stdin)
    Render {
        input: String,

        #[command(flatten)]
        output: OutputArgs,

        /// `png`, `svg`, or `tree` to print the parsed element tree as JSON
        #[arg(long, value_enum, default_value_t = CliFormat::Png)]
        format: CliFormat,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Background color painted behind the root element
        #[arg(long = "background", value_name = "COLOR")]
        background: Option<String>,

        #[arg(long = "font-family", value_name = "FAMILY")]
        font_family: Option<String>,

        /// JSON file with default render options (camelCase keys)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Render one of the built-in card templates from JSON data
    Card {
        #[arg(value_enum)]
        kind: CardKind,

        #[arg(long, value_name = "FILE.json")]
        data: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[arg(long, value_enum, default_value_t = CliFormat::Png)]
        format: CliFormat,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output file; stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Font to load, repeatable: FAMILY[:WEIGHT[:STYLE]]=PATH
    #[arg(long = "font", value_name = "SPEC")]
    fonts: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CliFormat {
    Png,
    Svg,
    Tree,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CardKind {
    Rank,
    Welcome,
    LevelUp,
}

fn parse_font_arg(spec: &str) -> anyhow::Result<FontEntry> {
    let (face, path) = spec
        .split_once('=')
        .with_context(|| format!("font '{}' must look like FAMILY[:WEIGHT[:STYLE]]=PATH", spec))?;

    let mut parts = face.split(':');
    let family = parts.next().unwrap_or_default().trim();
    if family.is_empty() {
        bail!("font '{}' has an empty family", spec);
    }
    let data = fs::read(path).with_context(|| format!("failed to read font file {}", path))?;
    let mut entry = FontEntry::new(family, data);

    if let Some(weight) = parts.next() {
        let weight = weight
            .parse::<u16>()
            .ok()
            .and_then(FontWeight::new)
            .with_context(|| format!("invalid font weight '{}' (100..=900 in steps of 100)", weight))?;
        entry = entry.with_weight(weight);
    }
    if let Some(style) = parts.next() {
        entry = entry.with_style(style.parse::<FontStyle>()?);
    }
    if parts.next().is_some() {
        bail!("font '{}' has too many ':' fields", spec);
    }
    Ok(entry)
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> anyhow::Result<()> {
    match path {
        Some(path) => fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            out.write_all(bytes)?;
            out.flush()?;
            Ok(())
        }
    }
}

fn render(
    canvas: &Canvas,
    markup: &str,
    format: CliFormat,
    mut request: RenderRequest,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    if format == CliFormat::Tree {
        let tree = cardcanvas::parse(markup)?;
        let mut json = serde_json::to_string_pretty(&tree)?;
        json.push('\n');
        return write_output(output.output.as_deref(), json.as_bytes());
    }

    request.format = Some(match format {
        CliFormat::Svg => OutputFormat::Svg,
        _ => OutputFormat::Png,
    });
    request.fonts = output
        .fonts
        .iter()
        .map(|spec| parse_font_arg(spec))
        .collect::<anyhow::Result<_>>()?;

    let result = canvas.render(markup, &request)?;
    if let Some(path) = &output.output {
        eprintln!("wrote {} ({} bytes, sha256 {})", path.display(), result.as_bytes().len(), result.digest());
    }
    write_output(output.output.as_deref(), result.as_bytes())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Render {
            input,
            output,
            format,
            width,
            height,
            background,
            font_family,
            config,
        } => {
            let defaults = match &config {
                Some(path) => read_json::<RenderOptions>(path)?,
                None => RenderOptions::default(),
            };
            let canvas = Canvas::new(defaults)?;
            let markup = read_input(&input)?;
            let request = RenderRequest {
                width,
                height,
                background_color: background,
                default_font_family: font_family,
                ..Default::default()
            };
            render(&canvas, &markup, format, request, &output)
        }
        Command::Card {
            kind,
            data,
            output,
            format,
        } => {
            let (markup, (width, height)) = match kind {
                CardKind::Rank => (
                    templates::rank_card(&read_json::<RankCardData>(&data)?),
                    templates::RANK_CARD_SIZE,
                ),
                CardKind::Welcome => (
                    templates::welcome_card(&read_json::<WelcomeCardData>(&data)?),
                    templates::WELCOME_CARD_SIZE,
                ),
                CardKind::LevelUp => (
                    templates::level_up_card(&read_json::<LevelUpData>(&data)?),
                    templates::LEVEL_UP_CARD_SIZE,
                ),
            };
            let canvas = Canvas::new(RenderOptions::default())?;
            let request = RenderRequest {
                width: Some(width),
                height: Some(height),
                ..Default::default()
            };
            render(&canvas, &markup, format, request, &output)
        }
    }
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("cardcanvas: {:#}", e);
        std::process::exit(1);
    }
}
