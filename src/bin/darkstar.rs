//! `darkstar` CLI: a thin, interchangeable wrapper around the library's
//! `encrypt`/`decrypt` pair. No cryptographic logic lives here.

use clap::{Args, Parser, Subcommand};
use darkstar::{decrypt, encrypt, Error, Version};
use serde::Serialize;

const TEST_MNEMONIC: &str = "cat dog fish bird";
const TEST_PASSWORD: &str = "MySecre!Password123";

#[derive(Parser)]
#[command(name = "darkstar", about = "Password-based encryption for short token sequences")]
struct Cli {
    #[command(flatten)]
    version: VersionFlags,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
#[group(multiple = false)]
struct VersionFlags {
    /// Use the legacy V1 format (bare AES transit string, JSON reverse key).
    #[arg(long = "v1")]
    v1: bool,
    /// Use the V2 format (JSON envelope, fixed 12-deep cycle).
    #[arg(long = "v2")]
    v2: bool,
    /// Use the V3 format (default): GCM, variable-depth cycle.
    #[arg(long = "v3")]
    v3: bool,
}

impl VersionFlags {
    fn resolve(&self) -> Version {
        if self.v1 {
            Version::V1
        } else if self.v2 {
            Version::V2
        } else if self.v3 {
            Version::V3
        } else {
            Version::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt a mnemonic under a password.
    Encrypt { mnemonic: String, password: String },
    /// Decrypt previously-encrypted data back to its mnemonic.
    Decrypt {
        encrypted_data: String,
        reverse_key: String,
        password: String,
    },
    /// Run the built-in self-test fixture against V3 and report the result.
    Test,
}

#[derive(Serialize)]
struct EncryptOutput {
    #[serde(rename = "encryptedData")]
    encrypted_data: String,
    #[serde(rename = "reverseKey")]
    reverse_key: String,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_encrypt(mnemonic: &str, password: &str, version: Version) -> Result<(), Error> {
    let (encrypted_data, reverse_key) = encrypt(mnemonic, password, version)?;
    let output = EncryptOutput {
        encrypted_data,
        reverse_key,
    };
    println!("{}", serde_json::to_string(&output).expect("serializable output"));
    Ok(())
}

fn run_decrypt(encrypted_data: &str, reverse_key: &str, password: &str) -> Result<(), Error> {
    let mnemonic = decrypt(encrypted_data, reverse_key, password)?;
    println!("{mnemonic}");
    Ok(())
}

fn run_test() -> Result<(), Error> {
    let (encrypted_data, reverse_key) = encrypt(TEST_MNEMONIC, TEST_PASSWORD, Version::V3)?;
    let roundtripped = decrypt(&encrypted_data, &reverse_key, TEST_PASSWORD)?;
    if roundtripped == TEST_MNEMONIC {
        println!("PASSED");
        Ok(())
    } else {
        println!("FAILED: expected {TEST_MNEMONIC:?}, got {roundtripped:?}");
        Err(Error::DecryptionError)
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let version = cli.version.resolve();

    let result = match cli.command {
        Command::Encrypt { mnemonic, password } => run_encrypt(&mnemonic, &password, version),
        Command::Decrypt {
            encrypted_data,
            reverse_key,
            password,
        } => run_decrypt(&encrypted_data, &reverse_key, &password),
        Command::Test => run_test(),
    };

    if let Err(err) = result {
        tracing::error!(%err, "darkstar command failed");
        std::process::exit(1);
    }
}
