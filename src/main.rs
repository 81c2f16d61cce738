//! Plan comparison CLI
//!
//! Evaluates every plan offered in a region for one household and prints a
//! comparison table (or the full result as JSON)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use plan_cost_engine::{
    load_funding, load_household, CalculationArgs, ComparisonRunner, FundPolicy, PlanComparison,
    RankingPriority,
};

#[derive(Debug, Parser)]
#[command(name = "plan-compare", version, about = "Compare benefit plan costs for a household")]
struct Cli {
    /// Benefits configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Household utilization (CSV: Member,Role,Service,Count)
    #[arg(long)]
    household: PathBuf,

    #[arg(long)]
    region: String,

    #[arg(long)]
    status: String,

    /// Per-plan funding inputs (JSON map of plan id to funding)
    #[arg(long)]
    funding: Option<PathBuf>,

    /// no-funds, employer-core, employer, employee or all-funds
    #[arg(long, default_value = "all-funds")]
    policy: FundPolicy,

    /// premium, net-out-of-pocket, total-cost, worst-case or savings-account
    #[arg(long, default_value = "total-cost")]
    priority: RankingPriority,

    /// Also compare with employee funding removed
    #[arg(long)]
    no_employee_funding: bool,

    /// Print the full comparison as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let runner = ComparisonRunner::from_path(&cli.config)
        .with_context(|| format!("loading configuration {}", cli.config.display()))?;
    let household = load_household(&cli.household)
        .with_context(|| format!("loading household {}", cli.household.display()))?;

    let mut args = CalculationArgs::new(&cli.region, &cli.status, household);
    if let Some(path) = &cli.funding {
        args.funding = load_funding(path).with_context(|| format!("loading funding {}", path.display()))?;
    }
    args.fund_policy = cli.policy;
    args.priority = cli.priority;
    args.include_no_employee_funding = cli.no_employee_funding;

    let comparison = runner.run(&args).context("running comparison")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    println!("Plan Comparison");
    println!("===============\n");
    print_comparison(&comparison.comparison);

    if let Some(variant) = &comparison.no_employee_funding {
        println!("\nWithout employee funding ({})", FundPolicy::EmployerCoreOnly);
        println!("{}", "-".repeat(40));
        print_comparison(variant);
    }

    Ok(())
}

fn print_comparison(comparison: &PlanComparison) {
    println!("Coverage level: {}", comparison.coverage_level);
    println!();
    println!(
        "{:<24} {:>12} {:>12} {:>12} {:>12} {:>14} {:>14}",
        "Plan", "Premium", "Care", "Funds", "Net OOP", "Employee Tot", "Worst Case"
    );
    println!("{}", "-".repeat(106));

    for plan in &comparison.plans {
        println!(
            "{:<24} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>14.2} {:>14}",
            plan.plan_name,
            plan.premiums.employee,
            plan.totals.total_medical_and_drug_costs,
            plan.funds.total_offset,
            plan.net_out_of_pocket,
            plan.employee_total_annual_costs,
            format_bound(plan.worst_case_employee_costs),
        );
    }

    println!("\nRanked by {}: {}", comparison.priority, comparison.by_priority.join(", "));

    let flags = &comparison.flags;
    let mut notes = Vec::new();
    if flags.has_unbounded_worst_case {
        notes.push("some plans have no worst-case limit");
    }
    if flags.has_expenses_not_covered {
        notes.push("some services are not covered");
    }
    if flags.has_combined_limit_attained {
        notes.push("a combined reimbursement limit was reached");
    }
    if flags.has_additional_premiums {
        notes.push("some services carry additional premiums");
    }
    for note in notes {
        println!("  * {}", note);
    }
}

fn format_bound(amount: f64) -> String {
    if amount.is_finite() {
        format!("{:.2}", amount)
    } else {
        "unlimited".to_string()
    }
}
