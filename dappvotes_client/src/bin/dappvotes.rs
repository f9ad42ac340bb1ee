use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dappvotes_client::chain::ethers_contract;
use dappvotes_client::config::ClientConfig;
use dappvotes_client::format::{
    format_date, format_timestamp, now_millis, parse_datetime_local, truncate, TruncateParams,
};
use dappvotes_client::forms::{
    ContestPollForm, ContestantField, CreatePollForm, PollField, SubmitOutcome, Wallet,
};
use dappvotes_client::ipfs::{FetchOutcome, FileUpload, PinataClient, UploadOutcome};
use dappvotes_client::models::{Contestant, Poll, PollParams};
use dappvotes_client::normalize::{structure_contestants, structure_poll, structure_polls};
use dappvotes_client::notify::{track_transaction, LogNotifier, Notifier, TxMessages};
use dappvotes_client::PollContract;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dappvotes", version, about = "DappVotes CLI: polls on-chain, images on IPFS")]
struct Cli {
    /// YAML config file; environment variables are used when omitted
    #[arg(long, env = "DAPPVOTES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Image given either as an already pinned URL or as a local file to pin
#[derive(Args)]
struct ImageSource {
    /// URL of an image that is already hosted
    #[arg(long, conflicts_with = "image_file")]
    image_url: Option<String>,
    /// Local image to pin on IPFS first
    #[arg(long)]
    image_file: Option<PathBuf>,
}

#[derive(Args)]
struct PollArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    /// Start as local YYYY-MM-DDTHH:MM
    #[arg(long)]
    starts_at: String,
    /// End as local YYYY-MM-DDTHH:MM
    #[arg(long)]
    ends_at: String,
    #[command(flatten)]
    image: ImageSource,
}

#[derive(Subcommand)]
enum Commands {
    /// Pin a file on IPFS and print its gateway URL
    Upload {
        /// Path to the file to upload
        input: PathBuf,
    },
    /// Download pinned content through the gateway
    Fetch {
        /// IPFS hash (CID)
        hash: String,
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show the signing account
    Wallet,
    /// List polls, newest first
    Polls {
        /// Print normalized records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one poll with its contestants
    Poll {
        id: u64,
        #[arg(long)]
        json: bool,
    },
    /// List contestants of a poll, most votes first
    Contestants {
        poll_id: u64,
        #[arg(long)]
        json: bool,
    },
    /// Create a poll
    CreatePoll(PollArgs),
    /// Edit a poll that has no votes yet
    UpdatePoll {
        id: u64,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Delete a poll that has no votes yet
    DeletePoll { id: u64 },
    /// Enter a poll as a contestant
    Contest {
        poll_id: u64,
        #[arg(long)]
        name: String,
        #[command(flatten)]
        image: ImageSource,
    },
    /// Vote for a contestant
    Vote { poll_id: u64, contestant_id: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    match cli.command {
        Commands::Upload { input } => {
            let pinata = PinataClient::new(config.require_pinata()?.clone())?;
            let file = FileUpload::from_path(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let outcome = pinata.upload_file(file).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let UploadOutcome::Failed { error } = outcome {
                bail!(error);
            }
        }
        Commands::Fetch { hash, output } => {
            let pinata = PinataClient::new(config.require_pinata()?.clone())?;
            match pinata.get_file(&hash).await {
                FetchOutcome::Fetched { data } => {
                    tokio::fs::write(&output, &data).await?;
                    println!("wrote {} bytes to {}", data.len(), output.display());
                }
                FetchOutcome::Failed { error } => bail!(error),
            }
        }
        Commands::Wallet => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            match contract.account() {
                Some(account) => println!("{}", account),
                None => println!("No wallet connected"),
            }
        }
        Commands::Polls { json } => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            let polls = structure_polls(contract.get_polls().await?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&polls)?);
            } else if polls.is_empty() {
                println!("No polls yet");
            } else {
                for poll in &polls {
                    print_poll_line(poll);
                }
            }
        }
        Commands::Poll { id, json } => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            let (raw_poll, raw_contestants) =
                futures::try_join!(contract.get_poll(id), contract.get_contestants(id))?;
            let poll = structure_poll(raw_poll)?;
            let contestants = structure_contestants(raw_contestants)?;

            if json {
                let view = serde_json::json!({ "poll": poll, "contestants": contestants });
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_poll_detail(&poll);
                print_contestants(&contestants);
            }
        }
        Commands::Contestants { poll_id, json } => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            let contestants = structure_contestants(contract.get_contestants(poll_id).await?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contestants)?);
            } else {
                print_contestants(&contestants);
            }
        }
        Commands::CreatePoll(args) => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            let wallet = Wallet::from_contract(contract.as_ref());

            let mut form = CreatePollForm::new(notifier.clone());
            form.open()?;
            form.set_field(PollField::Title, args.title)?;
            form.set_field(PollField::Description, args.description)?;
            form.set_field(PollField::StartsAt, args.starts_at)?;
            form.set_field(PollField::EndsAt, args.ends_at)?;
            match (args.image.image_url, args.image.image_file) {
                (Some(url), _) => form.set_field(PollField::Image, url)?,
                (None, Some(path)) => {
                    let pinata = PinataClient::new(config.require_pinata()?.clone())?;
                    let file = FileUpload::from_path(&path).await?;
                    form.upload_image(&pinata, file).await?;
                }
                (None, None) => {}
            }

            report(form.submit(contract.as_ref(), &wallet).await?)?;
        }
        Commands::UpdatePoll { id, poll } => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            let image = match resolve_image(&config, poll.image).await? {
                Some(image) => image,
                None => structure_poll(contract.get_poll(id).await?)?.image,
            };
            let params = PollParams {
                image,
                title: poll.title,
                description: poll.description,
                starts_at: parse_datetime_local(&poll.starts_at)?,
                ends_at: parse_datetime_local(&poll.ends_at)?,
            };

            let messages = TxMessages::new("Poll updated successfully 👌");
            let receipt =
                track_transaction(notifier.as_ref(), &messages, contract.update_poll(id, &params))
                    .await?;
            println!("{}", receipt.tx_hash);
        }
        Commands::DeletePoll { id } => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            let messages = TxMessages::new("Poll deleted successfully 👌");
            let receipt =
                track_transaction(notifier.as_ref(), &messages, contract.delete_poll(id)).await?;
            println!("{}", receipt.tx_hash);
        }
        Commands::Contest {
            poll_id,
            name,
            image,
        } => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            let wallet = Wallet::from_contract(contract.as_ref());

            let mut form = ContestPollForm::new(poll_id, notifier.clone());
            form.open()?;
            form.set_field(ContestantField::Name, name)?;
            match (image.image_url, image.image_file) {
                (Some(url), _) => form.set_field(ContestantField::Image, url)?,
                (None, Some(path)) => {
                    let pinata = PinataClient::new(config.require_pinata()?.clone())?;
                    let file = FileUpload::from_path(&path).await?;
                    form.upload_image(&pinata, file).await?;
                }
                (None, None) => {}
            }

            report(form.submit(contract.as_ref(), &wallet).await?)?;
        }
        Commands::Vote {
            poll_id,
            contestant_id,
        } => {
            let contract = ethers_contract::connect(config.require_chain()?).await?;
            let messages = TxMessages::new("Voted successfully 👌");
            let receipt = track_transaction(
                notifier.as_ref(),
                &messages,
                contract.vote(poll_id, contestant_id),
            )
            .await?;
            println!("{}", receipt.tx_hash);
        }
    }

    Ok(())
}

async fn resolve_image(config: &ClientConfig, source: ImageSource) -> Result<Option<String>> {
    match (source.image_url, source.image_file) {
        (Some(url), _) => Ok(Some(url)),
        (None, Some(path)) => {
            let pinata = PinataClient::new(config.require_pinata()?.clone())?;
            let outcome = pinata.upload_file(FileUpload::from_path(&path).await?).await;
            match outcome {
                UploadOutcome::Uploaded { pinata_url, .. } => {
                    info!("Pinned {} at {}", path.display(), pinata_url);
                    Ok(Some(pinata_url))
                }
                UploadOutcome::Failed { error } => Err(anyhow!(error)),
            }
        }
        (None, None) => Ok(None),
    }
}

fn report(outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Submitted(receipt) => {
            println!("{}", receipt.tx_hash);
            Ok(())
        }
        SubmitOutcome::Incomplete => bail!("Every field is required, including an image"),
        SubmitOutcome::WalletDisconnected => {
            bail!("No wallet connected; set DAPPVOTES_PRIVATE_KEY to sign transactions")
        }
        SubmitOutcome::Failed(reason) => bail!(reason),
    }
}

fn short_address(address: &str) -> String {
    truncate(TruncateParams {
        text: address,
        start_chars: 4,
        end_chars: 4,
        max_length: 11,
    })
}

fn print_poll_line(poll: &Poll) {
    println!(
        "#{:<4} {:<32} {:?} votes={} contestants={} director={} ends {}",
        poll.id,
        truncate(TruncateParams {
            text: &poll.title,
            start_chars: 29,
            end_chars: 0,
            max_length: 32,
        }),
        poll.status(now_millis()),
        poll.votes,
        poll.contestants,
        short_address(&poll.director),
        format_date(poll.ends_at).unwrap_or_default(),
    );
}

fn print_poll_detail(poll: &Poll) {
    println!("#{} {}", poll.id, poll.title);
    println!("{}", poll.description);
    println!("image:    {}", poll.image);
    println!("director: {}", poll.director);
    println!(
        "window:   {} -> {} ({:?})",
        format_timestamp(poll.starts_at).unwrap_or_default(),
        format_timestamp(poll.ends_at).unwrap_or_default(),
        poll.status(now_millis()),
    );
    println!("votes:    {}", poll.votes);
}

fn print_contestants(contestants: &[Contestant]) {
    if contestants.is_empty() {
        println!("No contestants yet");
        return;
    }
    for contestant in contestants {
        println!(
            "  {:>3}. {:<24} votes={} by {}",
            contestant.id,
            contestant.name,
            contestant.votes,
            short_address(&contestant.voter),
        );
    }
}
