use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::assets::CdnResolver;
use crate::config::{parse_non_negative, parse_positive, GalleryConfig};
use crate::models::{LayoutPosition, MediaItem};

pub const USAGE: &str = "\
Usage: waterfall [OPTIONS]

Options:
  --path DIR                 Media directory (default: pictures directory)
  --width PX                 Container width (default: 1280)
  --viewport PX              Viewport height (default: 800)
  --scroll PX                Scroll offset (default: 0)
  --buffer N                 Tiles mounted beyond each viewport edge
  --min-column-width PX      Minimum column width
  --gap PX                   Gap between tiles and columns
  --cdn OWNER/REPO[/PREFIX]  Resolve URLs through jsDelivr instead of file://
  --probe                    Read image headers when names carry no size
  --bench                    Simulate a scroll sweep and print frame timings
  --help                     Print this message";

/// Parsed command line, layered over an existing config.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub path: Option<PathBuf>,
    pub width: f64,
    pub viewport_height: f64,
    pub scroll_top: f64,
    pub cdn: Option<CdnResolver>,
    pub probe: bool,
    pub bench: bool,
    pub help: bool,
    pub config: GalleryConfig,
}

impl CliArgs {
    fn with_config(config: GalleryConfig) -> Self {
        Self {
            path: None,
            width: 1280.0,
            viewport_height: 800.0,
            scroll_top: 0.0,
            cdn: None,
            probe: false,
            bench: false,
            help: false,
            config,
        }
    }
}

/// Parses arguments (without the program name). Flags override `config`.
pub fn parse_args<I>(args: I, config: GalleryConfig) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::with_config(config);

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--path" => {
                let value = args.next().context("Missing value for --path")?;
                parsed.path = Some(PathBuf::from(value));
            }
            "--width" => {
                let value = args.next().context("Missing value for --width")?;
                parsed.width =
                    parse_positive(&value).context("Failed to parse --width as a positive number")?;
            }
            "--viewport" => {
                let value = args.next().context("Missing value for --viewport")?;
                parsed.viewport_height = parse_non_negative(&value)
                    .context("Failed to parse --viewport as a non-negative number")?;
            }
            "--scroll" => {
                let value = args.next().context("Missing value for --scroll")?;
                parsed.scroll_top = parse_non_negative(&value)
                    .context("Failed to parse --scroll as a non-negative number")?;
            }
            "--buffer" => {
                let value = args.next().context("Missing value for --buffer")?;
                parsed.config.buffer_count = value
                    .parse::<usize>()
                    .context("Failed to parse --buffer as a non-negative integer")?;
            }
            "--min-column-width" => {
                let value = args.next().context("Missing value for --min-column-width")?;
                parsed.config.layout.min_column_width = parse_positive(&value)
                    .context("Failed to parse --min-column-width as a positive number")?;
            }
            "--gap" => {
                let value = args.next().context("Missing value for --gap")?;
                parsed.config.layout.gap = parse_non_negative(&value)
                    .context("Failed to parse --gap as a non-negative number")?;
            }
            "--cdn" => {
                let value = args.next().context("Missing value for --cdn")?;
                let Some(resolver) = CdnResolver::parse(&value) else {
                    bail!("Expected --cdn OWNER/REPO[/PREFIX], got {value:?}");
                };
                parsed.cdn = Some(resolver);
            }
            "--probe" => parsed.probe = true,
            "--bench" => parsed.bench = true,
            "-h" | "--help" => parsed.help = true,
            other => bail!("Unknown argument: {other}"),
        }
    }

    Ok(parsed)
}

/// One line of the mounted-subset listing.
pub fn describe_tile(index: usize, item: &MediaItem, pos: &LayoutPosition, url: &str) -> String {
    let size = if item.size > 0 {
        item.size.to_string()
    } else {
        "-".to_string()
    };
    format!(
        "{index:>5} {:<40} {size:>10} top={:.0} left={:.0} {:.0}x{:.0} {url}",
        item.display_name, pos.top, pos.left, pos.width, pos.height
    )
}
