//! Command-line gateway client

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use regbatch::client::*;
use regbatch::codec::{DataType, Value};
use regbatch::config::{ConfigError, GatewayConfig};
use regbatch::decode::{AppDecodeLevel, DecodeLevel, HttpDecodeLevel};
use regbatch::error::{DecodeError, FrameError, RequestError};
use regbatch::lrc;
use regbatch::types::{BatchReadResult, ReadItem};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("unable to read {path}: {source}")]
    ItemFile {
        path: String,
        source: std::io::Error,
    },
    #[error("bad item file {path}: {source}")]
    ItemJson {
        path: String,
        source: serde_json::Error,
    },
    #[error("bad item '{0}', expected name:channel:addr:type[:scale[:unit]]")]
    BadItem(String),
    #[error("bad value '{value}' for type {data_type}")]
    BadValue { value: String, data_type: DataType },
    #[error("no items given, use --file or --item")]
    NoItems,
    #[error("batch read failed with state {state}: {message}")]
    Batch { state: i32, message: String },
    #[error("LRC mismatch: claimed {claimed:02X}, computed {computed:02X}")]
    LrcMismatch { claimed: u8, computed: u8 },
}

#[derive(Parser)]
#[command(name = "regbatch-client")]
#[command(about = "A command line program for batch reading gateway registers using the regbatch crate")]
#[command(version)]
struct Cli {
    #[arg(
        short = 'g',
        long,
        env = "REGBATCH_GATEWAY",
        help = "Base URL of the gateway, overrides the config file"
    )]
    gateway: Option<String>,

    #[arg(short = 't', long, help = "Request timeout in milliseconds")]
    timeout_ms: Option<u64>,

    #[arg(short = 'c', long, help = "Optional JSON gateway configuration file")]
    config: Option<PathBuf>,

    #[arg(short = 'd', long, value_enum, default_value_t = Decode::Nothing, help = "How much of the traffic to log")]
    decode: Decode,

    #[arg(short = 'v', long, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, ValueEnum)]
enum Decode {
    Nothing,
    Summary,
    Headers,
    Values,
}

impl From<Decode> for DecodeLevel {
    fn from(level: Decode) -> Self {
        match level {
            Decode::Nothing => DecodeLevel::nothing(),
            Decode::Summary => DecodeLevel::new(AppDecodeLevel::Summary, HttpDecodeLevel::Status),
            Decode::Headers => {
                DecodeLevel::new(AppDecodeLevel::ItemHeaders, HttpDecodeLevel::Status)
            }
            Decode::Values => DecodeLevel::new(AppDecodeLevel::ItemValues, HttpDecodeLevel::Body),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "read a batch of items once")]
    Read(ItemArgs),

    #[command(about = "read a batch of items periodically until Ctrl-C")]
    Monitor(MonitorArgs),

    #[command(about = "read a single value")]
    Get(GetArgs),

    #[command(about = "write a single value")]
    Set(SetArgs),

    #[command(about = "compute or check the LRC of a hex payload")]
    Lrc(LrcArgs),
}

#[derive(Args)]
struct ItemArgs {
    #[arg(short = 'f', long, help = "JSON file containing an array of read items")]
    file: Option<PathBuf>,

    #[arg(
        short = 'i',
        long = "item",
        help = "an item specified as name:channel:addr:type[:scale[:unit]], may be repeated"
    )]
    items: Vec<String>,
}

#[derive(Args)]
struct MonitorArgs {
    #[command(flatten)]
    items: ItemArgs,

    #[arg(short = 'p', long, default_value_t = 1000, help = "Pause between cycles in milliseconds")]
    interval_ms: u64,
}

#[derive(Args)]
struct GetArgs {
    #[arg(short = 'n', long, help = "the channel id")]
    channel: u32,

    #[arg(short = 'a', long, help = "the register or coil address")]
    addr: u32,

    #[arg(short = 't', long = "type", help = "the data type (e.g. uint16, float32)")]
    data_type: String,
}

#[derive(Args)]
struct SetArgs {
    #[command(flatten)]
    target: GetArgs,

    #[arg(short = 'v', long, allow_hyphen_values = true, help = "the value to write")]
    value: String,
}

#[derive(Args)]
struct LrcArgs {
    #[arg(help = "the payload as hex (e.g. 00100B00001001)")]
    payload: String,

    #[arg(long, help = "print the complete ASCII frame")]
    frame: bool,

    #[arg(long, value_parser = parse_hex_byte, help = "verify a claimed LRC given as hex")]
    check: Option<u8>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();

    if let Err(ref e) = run(cli).await {
        println!("error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Error> {
    let decode = DecodeLevel::from(cli.decode);

    if let Command::Lrc(args) = &cli.command {
        return run_lrc(args);
    }

    let gateway = create_gateway(&cli, decode.http)?;

    match cli.command {
        Command::Read(args) => {
            let items = load_items(&args)?;
            let engine = BatchReadEngine::new(gateway).with_decode_level(decode.app);
            let result = engine.read(&items).await;
            print_result(&result);
            if !result.is_success() {
                return Err(Error::Batch {
                    state: result.state,
                    message: result.message,
                });
            }
        }
        Command::Monitor(args) => {
            let items = load_items(&args.items)?;
            let engine = BatchReadEngine::new(gateway).with_decode_level(decode.app);
            run_monitor(engine, items, Duration::from_millis(args.interval_ms)).await?;
        }
        Command::Get(args) => {
            let data_type: DataType = args.data_type.parse()?;
            let client = CommandClient::new(gateway);
            let value = client.read(args.channel, args.addr, data_type).await?;
            println!("{value}");
        }
        Command::Set(args) => {
            let data_type: DataType = args.target.data_type.parse()?;
            let value = parse_value(&args.value, data_type)?;
            let client = CommandClient::new(gateway);
            client
                .write(args.target.channel, args.target.addr, value, data_type)
                .await?;
            println!("ok");
        }
        Command::Lrc(_) => {}
    }

    Ok(())
}

fn create_gateway(cli: &Cli, decode: HttpDecodeLevel) -> Result<Arc<dyn Gateway>, Error> {
    let mut config = match &cli.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(url) = &cli.gateway {
        config.base_url = url.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
        config.command_timeout_ms = timeout_ms;
    }

    let gateway = HttpGateway::new(config)?.with_decode_level(decode);
    tracing::debug!("gateway: {}", gateway.config().base_url);
    Ok(Arc::new(gateway))
}

async fn run_monitor(
    engine: BatchReadEngine,
    items: Vec<ReadItem>,
    interval: Duration,
) -> Result<(), Error> {
    let mut handle = RealtimeMonitor::new(engine, items, interval).spawn(4);

    let token: CancellationToken = handle.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stopping");
            token.cancel();
        }
    });

    while let Some(snapshot) = handle.next().await {
        println!(
            "--- cycle {} @ {} ---",
            snapshot.cycle,
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S%.3f")
        );
        print_result(&snapshot.result);
    }

    handle.join().await;
    Ok(())
}

fn run_lrc(args: &LrcArgs) -> Result<(), Error> {
    let payload = lrc::parse_hex(&args.payload)?;
    let computed = lrc::compute(&payload);

    if let Some(claimed) = args.check {
        if !lrc::verify(&payload, claimed) {
            return Err(Error::LrcMismatch { claimed, computed });
        }
        println!("LRC {claimed:02X} ok");
        return Ok(());
    }

    if args.frame {
        println!("{}", String::from_utf8_lossy(&lrc::encode_ascii_frame(&payload)).trim_end());
    } else {
        println!("{computed:02X}");
    }
    Ok(())
}

fn print_result(result: &BatchReadResult) {
    for item in &result.data {
        println!("{item}");
    }
    println!("state: {} ({})", result.state, result.message);
}

fn load_items(args: &ItemArgs) -> Result<Vec<ReadItem>, Error> {
    let mut items: Vec<ReadItem> = match &args.file {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| Error::ItemFile {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| Error::ItemJson {
                path: path.display().to_string(),
                source,
            })?
        }
        None => Vec::new(),
    };

    for arg in &args.items {
        items.push(parse_item(arg)?);
    }

    if items.is_empty() {
        return Err(Error::NoItems);
    }
    Ok(items)
}

fn parse_item(arg: &str) -> Result<ReadItem, Error> {
    let bad = || Error::BadItem(arg.to_string());
    let parts: Vec<&str> = arg.split(':').collect();
    if !(4..=6).contains(&parts.len()) || parts[0].is_empty() {
        return Err(bad());
    }

    let channel: u32 = parts[1].parse().map_err(|_| bad())?;
    let addr: u32 = parts[2].parse().map_err(|_| bad())?;

    // unknown tags are forwarded and reported per item
    let mut item = ReadItem::untyped(parts[0], channel, addr, parts[3]);

    if let Some(scale) = parts.get(4).filter(|x| !x.is_empty()) {
        item = item.with_scale(scale.parse().map_err(|_| bad())?);
    }
    if let Some(unit) = parts.get(5).filter(|x| !x.is_empty()) {
        item = item.with_unit(*unit);
    }
    Ok(item)
}

fn parse_value(value: &str, data_type: DataType) -> Result<Value, Error> {
    let bad = || Error::BadValue {
        value: value.to_string(),
        data_type,
    };
    match data_type {
        DataType::Bool => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "off" => Ok(Value::Bool(false)),
            _ => Err(bad()),
        },
        DataType::Float32 | DataType::Float32Le | DataType::Float64 => {
            value.parse::<f64>().map(Value::Float).map_err(|_| bad())
        }
        _ => value.parse::<i64>().map(Value::Integer).map_err(|_| bad()),
    }
}

fn parse_hex_byte(value: &str) -> Result<u8, String> {
    let value = value.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(value, 16).map_err(|err| err.to_string())
}
