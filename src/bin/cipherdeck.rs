//! Cipherdeck CLI
//!
//! Command-line front end for the cipherdeck library: password based file
//! encryption, digests and MACs, RSA key pairs with hybrid sealing, password
//! strength reports, and hiding text in PNG images.

use clap::{Parser, Subcommand};
use std::error::Error as StdError;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use cipherdeck::algorithm::{CipherAlgorithm, DigestAlgorithm};
use cipherdeck::asymmetric::{self, KeySize};
use cipherdeck::hybrid::{self, HybridResult};
use cipherdeck::kdf::{DEFAULT_ITERATIONS, KdfParams};
use cipherdeck::key_store::{FileKeyStore, KeyStore};
use cipherdeck::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};
use cipherdeck::{
    CipherdeckError, ErrorCategory, ErrorKind, Result, file_ops, mac, raster, stego, strength,
};

#[derive(Parser)]
#[command(name = "cipherdeck")]
#[command(version)]
#[command(about = "Password and public-key cryptography over text.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// PBKDF2 iteration count for password based encryption
    #[arg(long, global = true, default_value_t = DEFAULT_ITERATIONS, env = "CIPHERDECK_ITERATIONS")]
    iterations: u32,

    /// Directory holding named key pairs
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        default_value = "cipherdeck-keys",
        env = "CIPHERDECK_KEY_DIR"
    )]
    key_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the encrypted text to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file whose contents is to be decrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the unencrypted text to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Update an encrypted file with new content, while validating
    /// that the password is not accidentally changed.
    #[command(alias = "u")]
    Update {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the existing encrypted file to replace
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Print the hex digest of some text (stdin if TEXT is omitted)
    Digest {
        /// sha-256, sha-512, hmac-sha256 or checksum
        #[arg(short, long, default_value = "sha-256")]
        algorithm: String,

        /// Secret for keyed algorithms
        #[arg(long)]
        secret: Option<String>,

        text: Option<String>,
    },

    /// Compute or verify an HMAC-SHA256 tag (stdin if TEXT is omitted)
    Hmac {
        #[arg(long)]
        secret: String,

        /// Expected hex tag; exit non-zero if it does not match
        #[arg(long, value_name = "HEX")]
        verify: Option<String>,

        text: Option<String>,
    },

    /// Generate an RSA key pair and store it under NAME
    Keygen {
        name: String,

        /// Modulus size, 2048 or 4096
        #[arg(long, default_value_t = 2048)]
        bits: u32,
    },

    /// RSA-OAEP encrypt short text for the named key (stdin if TEXT is omitted)
    PkEncrypt {
        #[arg(short, long)]
        key: String,

        text: Option<String>,
    },

    /// RSA-OAEP decrypt with the named key (stdin if CIPHERTEXT is omitted)
    PkDecrypt {
        #[arg(short, long)]
        key: String,

        ciphertext: Option<String>,
    },

    /// Hybrid encrypt text of any length for the named key, printing JSON
    Seal {
        #[arg(short, long)]
        key: String,

        text: Option<String>,
    },

    /// Open the JSON output of `seal` with the named key
    Unseal {
        #[arg(short, long)]
        key: String,

        json: Option<String>,
    },

    /// Report on password strength (prompts if PASSWORD is omitted)
    Strength { password: Option<String> },

    /// Hide text in a PNG image
    Hide {
        /// Cover image
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Where to write the image carrying the text
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[arg(short, long)]
        text: String,

        /// Require a password to reveal the text
        #[arg(long)]
        lock: bool,
    },

    /// Print text hidden in a PNG image
    Reveal {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// The text was hidden with --lock
        #[arg(long)]
        lock: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        report(&e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CIPHERDECK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("cipherdeck=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let params = KdfParams::new(cli.iterations);

    match cli.command {
        Commands::Encrypt { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::encrypt_file(&input, &output, &mut *reader, &params)
        }
        Commands::Decrypt { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::decrypt_file(&input, &output, &mut *reader, &params)
        }
        Commands::Update { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::update_file(&input, &output, &mut *reader, &params)
        }
        Commands::Digest {
            algorithm,
            secret,
            text,
        } => {
            let algorithm: DigestAlgorithm = algorithm.parse()?;
            let text = text_or_stdin(text)?;
            println!("{}", algorithm.compute(&text, secret.as_deref())?);
            Ok(())
        }
        Commands::Hmac {
            secret,
            verify,
            text,
        } => {
            let text = text_or_stdin(text)?;
            match verify {
                None => println!("{}", mac::hmac(&text, &secret)?),
                Some(expected) => {
                    if !mac::verify(&text, &secret, &expected)? {
                        return Err(CipherdeckError::with_kind(
                            ErrorCategory::User,
                            ErrorKind::AuthenticationFailed,
                            "HMAC does not match",
                        ));
                    }
                    println!("OK");
                }
            }
            Ok(())
        }
        Commands::Keygen { name, bits } => {
            let size = KeySize::try_from(bits)?;
            let mut store = FileKeyStore::open(&cli.key_dir)?;
            let pair = asymmetric::generate_key_pair(size)?;
            store.save(&name, &pair)?;
            println!("{}", pair.public_key);
            Ok(())
        }
        Commands::PkEncrypt { key, text } => {
            let pair = FileKeyStore::open(&cli.key_dir)?.load(&key)?;
            let text = text_or_stdin(text)?;
            println!("{}", CipherAlgorithm::RsaOaep.encrypt(&text, &pair.public_key)?);
            Ok(())
        }
        Commands::PkDecrypt { key, ciphertext } => {
            let pair = FileKeyStore::open(&cli.key_dir)?.load(&key)?;
            let ciphertext = text_or_stdin(ciphertext)?;
            println!(
                "{}",
                CipherAlgorithm::RsaOaep.decrypt(&ciphertext, &pair.private_key)?
            );
            Ok(())
        }
        Commands::Seal { key, text } => {
            let pair = FileKeyStore::open(&cli.key_dir)?.load(&key)?;
            let text = text_or_stdin(text)?;
            let sealed = hybrid::encrypt(&text, &pair.public_key)?;
            println!("{}", to_json(&sealed)?);
            Ok(())
        }
        Commands::Unseal { key, json } => {
            let pair = FileKeyStore::open(&cli.key_dir)?.load(&key)?;
            let json = text_or_stdin(json)?;
            let sealed: HybridResult = serde_json::from_str(&json).map_err(|e| {
                CipherdeckError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Format,
                    "input is not sealed JSON",
                    e,
                )
            })?;
            print!("{}", sealed.decrypt(&pair.private_key)?);
            Ok(())
        }
        Commands::Strength { password } => {
            let password = match password {
                Some(password) => Zeroizing::new(password),
                None => get_passphrase_reader(cli.passphrase_stdin).read_passphrase()?,
            };
            println!("{}", to_json(&strength::analyze(&password))?);
            Ok(())
        }
        Commands::Hide {
            input,
            output,
            text,
            lock,
        } => {
            let mut image = raster::read_png(&input)?;
            if lock {
                let password = get_passphrase_reader(cli.passphrase_stdin).read_passphrase()?;
                stego::embed_locked(&mut image.pixels, &text, &password)?;
            } else {
                stego::embed(&mut image.pixels, &text)?;
            }
            raster::write_png(&output, &image)
        }
        Commands::Reveal { input, lock } => {
            let image = raster::read_png(&input)?;
            let text = if lock {
                let password = get_passphrase_reader(cli.passphrase_stdin).read_passphrase()?;
                stego::extract_locked(&image.pixels, &password)?
            } else {
                stego::extract(&image.pixels)
            };
            println!("{}", text);
            Ok(())
        }
    }
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}

/// Returns `text`, or everything on stdin when it was not given.
fn text_or_stdin(text: Option<String>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "failed to read text from stdin",
            e,
        )
    })?;
    Ok(buf)
}

fn to_json(value: &impl serde::Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "failed to serialize output",
            e,
        )
    })
}

fn report(err: &CipherdeckError) {
    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}
