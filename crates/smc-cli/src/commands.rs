//! # Escrow Subcommands
//!
//! Each handler loads the deployment, runs one operation against it, and
//! saves it only if the operation succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use smc_core::{Address, Amount, Clock, FixedClock, SystemClock, Timestamp};
use smc_escrow::{
    DeployContext, EscrowConfig, EscrowEvent, InMemoryToken, LegacyStaking, MigrationEscrow,
    TokenCustody,
};

use crate::deployment::Deployment;

/// Where state lives and what time it is.
#[derive(Clone)]
pub struct RunContext {
    /// Directory holding `deployment.json`.
    pub state_dir: PathBuf,
    /// Clock every escrow operation reads.
    pub clock: Arc<dyn Clock>,
}

impl RunContext {
    /// Create a context over an explicit clock.
    pub fn new(state_dir: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self { state_dir, clock }
    }

    /// Create a context pinned to `now` (unix seconds), or the system clock.
    pub fn at(state_dir: PathBuf, now: Option<i64>) -> Result<Self> {
        let clock: Arc<dyn Clock> = match now {
            Some(secs) => Arc::new(FixedClock::new(
                Timestamp::from_unix_seconds(secs).context("invalid --now")?,
            )),
            None => Arc::new(SystemClock),
        };
        Ok(Self::new(state_dir, clock))
    }
}

/// Arguments for `smc init`.
#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Escrow configuration file (YAML or JSON). Replaces the flags below.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// The migrated token.
    #[arg(long)]
    pub token: Option<Address>,
    /// The beneficiary, the only identity allowed to recover.
    #[arg(long)]
    pub stake_owner: Option<Address>,
    /// Receiver of recovered tokens.
    #[arg(long)]
    pub dest: Option<Address>,
    /// Legacy staking system address. Omit to bind the deployer.
    #[arg(long)]
    pub staking: Option<Address>,
    /// Cooldown in seconds.
    #[arg(long, conflicts_with = "cooldown_days")]
    pub cooldown_seconds: Option<u64>,
    /// Cooldown in whole days.
    #[arg(long)]
    pub cooldown_days: Option<u64>,
    /// Identity deploying the escrow.
    #[arg(long)]
    pub deployer: Address,
    /// Deployment counter of the deployer.
    #[arg(long, default_value_t = 0)]
    pub nonce: u64,
    /// Migration manager of the staking system. Defaults to the deployer.
    #[arg(long)]
    pub manager: Option<Address>,
}

/// Escrow subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Deploy the escrow together with its token ledger and staking system.
    Init(InitArgs),

    /// Issue new tokens to a holder.
    Mint {
        /// Receiving holder.
        #[arg(long)]
        to: Address,
        /// Amount in base units.
        #[arg(long)]
        amount: Amount,
    },

    /// Stake tokens in the legacy staking system.
    Stake {
        /// Staking owner; tokens are taken from this holder.
        #[arg(long)]
        owner: Address,
        /// Amount in base units.
        #[arg(long)]
        amount: Amount,
    },

    /// Approve the escrow as a migration destination.
    ApproveDestination {
        /// Must be the migration manager.
        #[arg(long)]
        caller: Address,
        /// Withdraw the approval instead.
        #[arg(long)]
        revoke: bool,
    },

    /// Migrate the caller's stake into the escrow.
    Migrate {
        /// Staking owner migrating their stake.
        #[arg(long)]
        caller: Address,
        /// Amount in base units.
        #[arg(long)]
        amount: Amount,
    },

    /// Call accept_migration directly, funding the batch from the caller.
    Accept {
        /// Identity issuing the call.
        #[arg(long)]
        caller: Address,
        /// Stake owner the batch is for.
        #[arg(long)]
        source_owner: Address,
        /// Amount in base units.
        #[arg(long)]
        amount: Amount,
    },

    /// Release the accumulated total to the destination.
    Recover {
        /// Identity issuing the call.
        #[arg(long)]
        caller: Address,
    },

    /// Show escrow state and phase.
    Status,

    /// Print the event log as JSON lines.
    Events,
}

/// Execute a subcommand.
pub fn run_command(command: &Command, ctx: &RunContext) -> Result<u8> {
    let state_dir = ctx.state_dir.as_path();
    match command {
        Command::Init(args) => cmd_init(ctx, args),
        Command::Mint { to, amount } => cmd_mint(state_dir, to, *amount),
        Command::Stake { owner, amount } => cmd_stake(state_dir, owner, *amount),
        Command::ApproveDestination { caller, revoke } => {
            cmd_approve_destination(state_dir, caller, *revoke)
        }
        Command::Migrate { caller, amount } => cmd_migrate(ctx, caller, *amount),
        Command::Accept {
            caller,
            source_owner,
            amount,
        } => cmd_accept(ctx, caller, source_owner, *amount),
        Command::Recover { caller } => cmd_recover(ctx, caller),
        Command::Status => cmd_status(ctx),
        Command::Events => cmd_events(state_dir),
    }
}

fn cmd_init(ctx: &RunContext, args: &InitArgs) -> Result<u8> {
    if Deployment::exists(&ctx.state_dir) {
        bail!("deployment already exists in {}", ctx.state_dir.display());
    }

    let config = match &args.config {
        Some(path) => EscrowConfig::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => EscrowConfig {
            token: args.token.context("--token is required without --config")?,
            stake_owner: args
                .stake_owner
                .context("--stake-owner is required without --config")?,
            dest_address: args.dest.context("--dest is required without --config")?,
            authorized_source: args.staking,
            cooldown_seconds: args.cooldown_seconds,
            cooldown_days: args.cooldown_days,
        },
    };

    let context = DeployContext::new(args.deployer, args.nonce);
    let escrow = MigrationEscrow::deploy(&config, context, ctx.clock.clone())
        .context("failed to deploy escrow")?;
    let manager = args.manager.unwrap_or(args.deployer);
    let deployment = Deployment {
        deployer: args.deployer,
        token: InMemoryToken::new(config.token),
        staking: LegacyStaking::new(escrow.authorized_source(), manager),
        escrow: escrow.snapshot(),
    };
    deployment.save(&ctx.state_dir)?;

    println!(
        "OK: deployed escrow {} (authorized source {}, cooldown {})",
        escrow.custody_address(),
        escrow.authorized_source(),
        escrow.cooldown()
    );
    Ok(0)
}

fn cmd_mint(state_dir: &Path, to: &Address, amount: Amount) -> Result<u8> {
    let mut deployment = Deployment::load(state_dir)?;
    deployment.token.mint(to, amount)?;
    deployment.save(state_dir)?;
    println!("OK: minted {amount} to {to}");
    Ok(0)
}

fn cmd_stake(state_dir: &Path, owner: &Address, amount: Amount) -> Result<u8> {
    let mut deployment = Deployment::load(state_dir)?;
    let staked = deployment
        .staking
        .stake(owner, amount, &mut deployment.token)?;
    deployment.save(state_dir)?;
    println!("OK: {owner} now has {staked} staked");
    Ok(0)
}

fn cmd_approve_destination(state_dir: &Path, caller: &Address, revoke: bool) -> Result<u8> {
    let mut deployment = Deployment::load(state_dir)?;
    let destination = deployment.escrow.custody_address;
    if revoke {
        deployment
            .staking
            .remove_migration_destination(caller, &destination)?;
    } else {
        deployment
            .staking
            .add_migration_destination(caller, &destination)?;
    }
    deployment.save(state_dir)?;
    let verb = if revoke { "revoked" } else { "approved" };
    println!("OK: {verb} migration destination {destination}");
    Ok(0)
}

fn cmd_migrate(ctx: &RunContext, caller: &Address, amount: Amount) -> Result<u8> {
    let mut deployment = Deployment::load(&ctx.state_dir)?;
    let mut escrow = deployment.open_escrow(ctx.clock.clone())?;
    let event =
        deployment
            .staking
            .migrate_staked_tokens(caller, &mut escrow, amount, &mut deployment.token)?;
    deployment.store_escrow(&escrow);
    deployment.save(&ctx.state_dir)?;
    print_event(&event);
    Ok(0)
}

fn cmd_accept(
    ctx: &RunContext,
    caller: &Address,
    source_owner: &Address,
    amount: Amount,
) -> Result<u8> {
    let mut deployment = Deployment::load(&ctx.state_dir)?;
    let mut escrow = deployment.open_escrow(ctx.clock.clone())?;
    deployment
        .token
        .transfer(caller, &escrow.custody_address(), amount)
        .context("failed to fund the batch")?;
    let event = escrow.accept_migration(caller, source_owner, amount)?;
    deployment.store_escrow(&escrow);
    deployment.save(&ctx.state_dir)?;
    print_event(&event);
    Ok(0)
}

fn cmd_recover(ctx: &RunContext, caller: &Address) -> Result<u8> {
    let mut deployment = Deployment::load(&ctx.state_dir)?;
    let mut escrow = deployment.open_escrow(ctx.clock.clone())?;
    let event = escrow.recover_tokens(caller, &mut deployment.token)?;
    deployment.store_escrow(&escrow);
    deployment.save(&ctx.state_dir)?;
    print_event(&event);
    Ok(0)
}

fn cmd_status(ctx: &RunContext) -> Result<u8> {
    let deployment = Deployment::load(&ctx.state_dir)?;
    let escrow = deployment.open_escrow(ctx.clock.clone())?;
    let custody_balance = deployment.token.balance_of(&escrow.custody_address());

    println!("Escrow: {}", escrow.custody_address());
    println!("  Phase: {}", escrow.phase());
    println!("  Token: {}", escrow.token());
    println!("  Authorized source: {}", escrow.authorized_source());
    println!("  Stake owner: {}", escrow.stake_owner());
    println!("  Destination: {}", escrow.dest_address());
    println!("  Cooldown: {}", escrow.cooldown());
    println!("  Total accumulated: {}", escrow.total_accumulated());
    match escrow.cooldown_expiry() {
        Some(expiry) => println!("  Cooldown expiry: {expiry}"),
        None => println!("  Cooldown expiry: not armed"),
    }
    println!("  Custody balance: {custody_balance}");
    println!("  Events: {}", escrow.events().len());
    println!("Holders:");
    for (holder, balance) in deployment.token.holders() {
        println!("  {holder}: {balance}");
    }
    Ok(0)
}

fn cmd_events(state_dir: &Path) -> Result<u8> {
    let deployment = Deployment::load(state_dir)?;
    if deployment.escrow.events.is_empty() {
        println!("No events.");
        return Ok(0);
    }
    for record in &deployment.escrow.events {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(0)
}

fn print_event(event: &EscrowEvent) {
    match event {
        EscrowEvent::AcceptedMigration {
            source_owner,
            amount,
            total,
        } => println!("OK: accepted {amount} for {source_owner} (total {total})"),
        EscrowEvent::TokensRecovered {
            caller,
            dest,
            amount,
        } => println!("OK: {caller} recovered {amount} to {dest}"),
    }
}
