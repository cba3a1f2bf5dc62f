use clap::Parser;
use color_eyre::eyre::Result;
use jwt_recover_core::{
    recover,
    rsa_recovery::{DEFAULT_EXPONENT, DEFAULT_SMALL_PRIME_BOUND},
    RecoveryOptions, RsaOptions,
};
use tracing::debug;

mod logging;
mod report;

/// Recovers the public key that signed RS256/RS384/RS512 or ES256/ES384/ES512
/// JSON Web Tokens.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JWTs signed by the same key; RSA needs at least two
    #[arg(required = true, value_name = "TOKEN")]
    tokens: Vec<String>,

    /// public exponent of the RSA key
    #[arg(short, long, default_value_t = DEFAULT_EXPONENT)]
    exponent: u32,

    /// export ECDSA keys with compressed points
    #[arg(long)]
    compressed: bool,

    /// prime factors below this bound are removed from the recovered modulus
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SMALL_PRIME_BOUND)]
    small_prime_bound: u32,

    /// print the result as json
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init("warn");

    let cli = Cli::parse();
    let options = RecoveryOptions {
        rsa: RsaOptions {
            exponent: cli.exponent,
            small_prime_bound: cli.small_prime_bound,
        },
        compressed: cli.compressed,
    };

    let outcome = recover(&cli.tokens, &options, &mut rand::thread_rng());
    if let Err(err) = &outcome {
        debug!(?err, "recovery did not produce a key");
    }

    let report = if cli.json {
        report::render_json(&outcome, options.compressed)?
    } else {
        report::render_text(&outcome, options.compressed)?
    };
    print!("{report}");

    Ok(())
}
