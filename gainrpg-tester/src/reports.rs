use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::simulation::{DayRecord, SimulationReport};

fn outcome_label(day: &DayRecord) -> &'static str {
    day.outcome.map_or("unresolved", |o| o.as_str())
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &SimulationReport,
    total_duration: Duration,
    verbose: bool,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Daily Run Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "====================".cyan())?;
    writeln!(out, "Theme: {}", report.theme)?;
    writeln!(out, "Strategy: {:?}", report.strategy)?;
    writeln!(out, "Days played: {} from {}", report.days.len(), report.start)?;
    writeln!(out, "Victory rate: {:.1}%", report.victory_rate())?;
    writeln!(out, "Coins earned: {}", report.total_coins().to_string().green())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for day in &report.days {
        let status = match day.outcome {
            Some(o) if o.is_victory() => format!("✅ {}", o.as_str()).green(),
            Some(o) => format!("⚠️  {}", o.as_str()).yellow(),
            None => "❌ unresolved".red(),
        };
        let boss = if day.boss { " 👑" } else { "" };
        writeln!(
            out,
            "{} {} {}{}",
            day.date,
            status,
            day.threat.bold(),
            boss
        )?;
        writeln!(
            out,
            "   Tier {} · {} rounds · grit {} · heat {} · level {}",
            day.tier, day.rounds, day.grit_after, day.heat_after, day.level_after
        )?;
        if !day.loot.is_empty() {
            writeln!(out, "   Loot: {}", day.loot.join(", "))?;
        }
        if day.tokens_spent > 0 {
            writeln!(out, "   Tokens spent: {}", day.tokens_spent)?;
        }
        if verbose && !day.narrative.is_empty() {
            writeln!(out, "   {}", day.narrative.dimmed())?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "🏆 Final Standing".bright_yellow().bold())?;
    writeln!(out, "{}", "=================".yellow())?;
    let standing = &report.standing;
    writeln!(out, "Level: {}", standing.level)?;
    writeln!(out, "Coins: {}", standing.coins)?;
    writeln!(out, "Renown: {}", standing.renown)?;
    writeln!(out, "Frontier heat: {}", standing.frontier_heat)?;
    writeln!(out, "Grit: {}", standing.grit)?;
    writeln!(out, "Items: {}", standing.items)?;
    writeln!(out, "Side quests: {}", standing.sidequests_completed)?;
    for (outcome, count) in &report.outcomes {
        writeln!(out, "  {outcome:27} {count}")?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    writeln!(out, "# Gain RPG Daily Run\n")?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Theme**: {}", report.theme)?;
    writeln!(out, "- **Strategy**: {:?}", report.strategy)?;
    writeln!(out, "- **Days**: {}", report.days.len())?;
    writeln!(out, "- **Victory rate**: {:.1}%", report.victory_rate())?;
    writeln!(out, "- **Coins earned**: {}", report.total_coins())?;
    writeln!(out, "- **Final level**: {}\n", report.standing.level)?;

    writeln!(out, "## Days\n")?;
    writeln!(
        out,
        "| Date | Threat | Boss | Tier | Rounds | Outcome | Coins | Grit |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|")?;
    for day in &report.days {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            day.date,
            day.threat,
            if day.boss { "yes" } else { "" },
            day.tier,
            day.rounds,
            outcome_label(day),
            day.coins_earned,
            day.grit_after
        )?;
    }

    let told: Vec<&DayRecord> = report.days.iter().filter(|d| !d.narrative.is_empty()).collect();
    if !told.is_empty() {
        writeln!(out, "\n## Narrative\n")?;
        for day in told {
            writeln!(out, "- **{}**: {}", day.date, day.narrative)?;
        }
    }
    Ok(())
}
