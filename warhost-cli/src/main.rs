use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use warhost_engine::{
    Catalog, EntryId, GameContext, Roster, StatKey, WoundState, WoundStore,
    apply_leader_damage, apply_unit_damage, collect_modifiers, combined_wound_state, heal_leader,
    heal_unit, leader_wound_state, modified_stats, unit_wound_state,
};

#[derive(Debug, Parser)]
#[command(name = "warhost", version)]
#[command(about = "Inspect effective stats and wound state for a Warhost roster")]
struct Args {
    /// Path to the catalog JSON file
    #[arg(long)]
    catalog: PathBuf,

    /// Path to the roster JSON file
    #[arg(long)]
    roster: PathBuf,

    /// Detachment id the roster is built with
    #[arg(long, default_value = "")]
    detachment: String,

    /// Optional game context JSON file (active stratagems, stance, ...)
    #[arg(long)]
    context: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print effective stats and wound state for roster entries
    Show {
        /// Restrict output to one entry id
        #[arg(long)]
        entry: Option<u32>,
        /// Also list every collected modifier with its provenance
        #[arg(long)]
        provenance: bool,
    },
    /// Apply damage to an entry and print the resulting wound state
    Damage {
        #[arg(long)]
        entry: u32,
        #[arg(long)]
        amount: i32,
        /// Target the attached leader's pool instead of the unit's
        #[arg(long)]
        leader: bool,
    },
    /// Heal an entry and print the resulting wound state
    Heal {
        #[arg(long)]
        entry: u32,
        #[arg(long)]
        amount: i32,
        /// Target the attached leader's pool instead of the unit's
        #[arg(long)]
        leader: bool,
    },
}

/// In-memory store backing the demo mutations; a real frontend would
/// persist the write instead.
struct MemoryStore<'a> {
    roster: &'a mut Roster,
}

impl WoundStore for MemoryStore<'_> {
    fn set_unit_wounds(&mut self, entry: EntryId, value: WoundState) {
        if let Err(err) = self.roster.set_unit_wounds(entry, value) {
            log::warn!("failed to record unit wounds: {err}");
        }
    }

    fn set_leader_wounds(&mut self, entry: EntryId, value: WoundState) {
        if let Err(err) = self.roster.set_leader_wounds(entry, value) {
            log::warn!("failed to record leader wounds: {err}");
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let catalog_text = fs::read_to_string(&args.catalog)
        .with_context(|| format!("failed to read catalog: {}", args.catalog.display()))?;
    let catalog = Catalog::from_json(&catalog_text)
        .with_context(|| format!("failed to parse catalog: {}", args.catalog.display()))?;

    let roster_text = fs::read_to_string(&args.roster)
        .with_context(|| format!("failed to read roster: {}", args.roster.display()))?;
    let mut roster = Roster::from_json(&roster_text)
        .with_context(|| format!("failed to parse roster: {}", args.roster.display()))?;

    let context = match &args.context {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read context: {}", path.display()))?;
            Some(
                serde_json::from_str::<GameContext>(&text)
                    .with_context(|| format!("failed to parse context: {}", path.display()))?,
            )
        }
        None => None,
    };

    match args.command {
        Command::Show { entry, provenance } => {
            show(&catalog, &roster, &args.detachment, context.as_ref(), entry, provenance);
        }
        Command::Damage { entry, amount, leader } => {
            let id = EntryId(entry);
            let snapshot = roster.clone();
            let mut store = MemoryStore { roster: &mut roster };
            let outcome = if leader {
                apply_leader_damage(&catalog, &snapshot, id, &args.detachment, amount, &mut store)
            } else {
                apply_unit_damage(&catalog, &snapshot, id, &args.detachment, amount, &mut store)
            };
            report_mutation(&catalog, &roster, &args.detachment, id, leader, outcome);
        }
        Command::Heal { entry, amount, leader } => {
            let id = EntryId(entry);
            let snapshot = roster.clone();
            let mut store = MemoryStore { roster: &mut roster };
            let outcome = if leader {
                heal_leader(&catalog, &snapshot, id, &args.detachment, amount, &mut store)
            } else {
                heal_unit(&catalog, &snapshot, id, &args.detachment, amount, &mut store)
            };
            report_mutation(&catalog, &roster, &args.detachment, id, leader, outcome);
        }
    }

    Ok(())
}

fn show(
    catalog: &Catalog,
    roster: &Roster,
    detachment: &str,
    context: Option<&GameContext>,
    only: Option<u32>,
    provenance: bool,
) {
    for entry in roster.entries() {
        if let Some(id) = only {
            if entry.id != EntryId(id) {
                continue;
            }
        }
        let name = catalog
            .unit(&entry.unit)
            .map_or(entry.unit.as_str(), |u| u.name.as_str());
        println!(
            "{} {} ({} models)",
            format!("[{}]", entry.id.0).bold(),
            name.bold(),
            entry.models
        );

        match modified_stats(catalog, roster, entry.id, detachment, context) {
            Some(stats) => {
                for key in StatKey::CHARACTERISTICS {
                    let Some(stat) = stats.get(key) else { continue };
                    let marker = if stat.has_modifier { "*".yellow().to_string() } else { " ".to_string() };
                    println!(
                        "  {:<18} {:>4} -> {:>4}{}",
                        format!("{key:?}"),
                        stat.base.to_string(),
                        stat.modified.to_string(),
                        marker
                    );
                }
            }
            None => println!("  {}", "unit not found in catalog".red()),
        }

        if let Some(unit) = unit_wound_state(catalog, roster, entry.id, detachment) {
            println!(
                "  wounds: {}/{} ({} of {} models alive)",
                unit.current, unit.total, unit.models_alive, unit.models
            );
        }
        if let Some(leader) = leader_wound_state(catalog, roster, entry.id, detachment) {
            println!("  leader wounds: {}/{}", leader.current, leader.total);
        }
        if let Some(combined) = combined_wound_state(catalog, roster, entry.id, detachment) {
            if entry.attached_leader.is_some() {
                println!("  combined: {}/{}", combined.current, combined.total);
            }
        }

        if provenance {
            for c in collect_modifiers(catalog, roster, entry.id, detachment, context) {
                println!(
                    "    {:<20} {:?} {:?} {} ({:?})",
                    c.source.cyan(),
                    c.modifier.stat,
                    c.modifier.op,
                    c.modifier.value,
                    c.kind
                );
            }
        }
        println!();
    }
}

fn report_mutation(
    catalog: &Catalog,
    roster: &Roster,
    detachment: &str,
    id: EntryId,
    leader: bool,
    outcome: Option<WoundState>,
) {
    match outcome {
        None => println!("{}", "entry or leader not found; nothing applied".red()),
        Some(state) => {
            let pool = if leader { "leader" } else { "unit" };
            println!("{pool} pool now {state:?}");
            let tracking = if leader {
                leader_wound_state(catalog, roster, id, detachment)
            } else {
                unit_wound_state(catalog, roster, id, detachment)
            };
            if let Some(t) = tracking {
                println!(
                    "{}",
                    format!(
                        "{}/{} wounds, {} of {} models alive",
                        t.current, t.total, t.models_alive, t.models
                    )
                    .green()
                );
            }
        }
    }
}
