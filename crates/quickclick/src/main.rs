use std::time::Duration;

use clap::Parser;
use quickclick::logging::setup_logger;
use quickclick::prelude::*;

/// Quickclick game server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Port to listen on
    #[clap(short, long, default_value = "3000")]
    port: u16,
    /// Points every player starts a game with
    #[clap(long, default_value = "3", value_parser = parse_points)]
    starting_points: f64,
    /// Most players that can sit in the room (2 to 10)
    #[clap(
        long,
        default_value = "10",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(2..=10)
    )]
    max_players: usize,
    /// Length of the click window, in seconds
    #[clap(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    countdown_secs: u64,
    /// Default log level when RUST_LOG is unset
    #[clap(long, default_value = "info")]
    log_level: String,
    /// Log every state store row change at debug level
    #[clap(long)]
    trace_rows: bool,
}

/// A finite, strictly positive number of points.
fn parse_points(raw: &str) -> Result<f64, String> {
    let points: f64 = raw
        .parse()
        .map_err(|e| format!("`{raw}` is not a number: {e}"))?;
    if points.is_finite() && points > 0.0 {
        Ok(points)
    } else {
        Err(format!("starting points must be a positive number, got `{raw}`"))
    }
}

#[tokio::main]
async fn main() -> Result<(), QuickClickError> {
    let args = Args::parse();
    setup_logger(&args.log_level);

    let room_config = RoomConfig {
        starting_points: args.starting_points,
        max_players: args.max_players,
        countdown: Duration::from_secs(args.countdown_secs),
        ..RoomConfig::default()
    };

    let server = QuickClickServer::builder()
        .bind(&format!("{}:{}", args.host, args.port))
        .room_config(room_config)
        .trace_rows(args.trace_rows)
        .build()
        .await?;
    let room = server.room();

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    room.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("quickclick-server").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults_match_room_config() {
        let args = parse(&[]).unwrap();
        let defaults = RoomConfig::default();
        assert_eq!(args.starting_points, defaults.starting_points);
        assert_eq!(args.max_players, defaults.max_players);
        assert_eq!(args.countdown_secs, 5);
        assert_eq!(args.port, 3000);
    }

    #[test]
    fn test_starting_points_must_be_positive_and_finite() {
        assert_eq!(parse(&["--starting-points", "2.5"]).unwrap().starting_points, 2.5);
        for bad in ["0", "-1", "NaN", "inf", "lots"] {
            assert!(
                parse(&["--starting-points", bad]).is_err(),
                "`{bad}` should be rejected"
            );
        }
    }

    #[test]
    fn test_max_players_is_capped_at_ten() {
        assert_eq!(parse(&["--max-players", "4"]).unwrap().max_players, 4);
        assert!(parse(&["--max-players", "11"]).is_err());
        assert!(parse(&["--max-players", "1"]).is_err());
    }

    #[test]
    fn test_countdown_must_be_at_least_one_second() {
        assert!(parse(&["--countdown-secs", "0"]).is_err());
        assert_eq!(parse(&["--countdown-secs", "2"]).unwrap().countdown_secs, 2);
    }
}
