use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Meal planning, shopping lists and supermarket price comparison", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Model identifier sent to the AI gateway
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a consolidated shopping list from recipes, minus pantry stock
    Shop {
        /// JSON array of recipes
        #[arg(short, long)]
        recipes: PathBuf,
        /// JSON array of pantry items
        #[arg(short, long)]
        pantry: Option<PathBuf>,
        /// JSON meal plan; without it every recipe is cooked once as written
        #[arg(long)]
        plan: Option<PathBuf>,
        #[arg(long, requires = "plan")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "plan")]
        to: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Price a shopping list at every store in the catalog
    Compare {
        /// JSON array of shopping items
        #[arg(short, long)]
        list: PathBuf,
        /// CSV price catalog (Store, Item, Pack Size, Unit, Price)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        /// Flat estimate charged for items no store prices
        #[arg(long, value_parser = parse_price)]
        fallback_price: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Show nutrient totals for a day against the daily targets
    Nutrition {
        /// JSON array of cooked meals
        #[arg(short, long)]
        log: PathBuf,
        #[arg(short, long)]
        date: NaiveDate,
        #[arg(short, long)]
        preferences: Option<PathBuf>,
    },
    /// Structure a free-text recipe with the AI gateway
    Parse {
        #[arg(short, long)]
        recipe_file: PathBuf,
    },
    /// Generate a recipe matching dietary preferences and pantry contents
    Generate {
        #[arg(long)]
        preferences: Option<PathBuf>,
        #[arg(long)]
        pantry: Option<PathBuf>,
        #[arg(long, default_value = "")]
        prompt: String,
    },
    /// Write cooking steps for a recipe, or amend its existing steps
    Steps {
        #[arg(short, long)]
        recipe: PathBuf,
        /// Instruction describing how to change the recipe's current steps
        #[arg(long)]
        amend: Option<String>,
    },
    /// Estimate per-serving nutrients for a recipe
    Estimate {
        #[arg(short, long)]
        recipe: PathBuf,
    },
    /// Suggest groceries that complement the pantry
    Suggest {
        #[arg(long)]
        pantry: PathBuf,
        #[arg(long)]
        preferences: Option<PathBuf>,
    },
}

/// A finite, non-negative price.
fn parse_price(raw: &str) -> Result<f64, String> {
    let price: f64 = raw.trim().parse().map_err(|_| format!("'{}' is not a number", raw))?;
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(format!("price must be a finite amount of zero or more, got '{}'", raw))
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shop_with_plan_range() {
        let cli = Cli::try_parse_from([
            "pantry_planner", "-vv", "shop", "--recipes", "r.json", "--plan", "m.json", "--from", "2026-05-01",
            "--to", "2026-05-07",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Shop { from, to, json, .. } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2026, 5, 1));
                assert_eq!(to, NaiveDate::from_ymd_opt(2026, 5, 7));
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn range_requires_a_plan() {
        let result = Cli::try_parse_from(["pantry_planner", "shop", "--recipes", "r.json", "--from", "2026-05-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn fallback_price_must_be_finite_and_non_negative() {
        let parse = |price: &str| {
            Cli::try_parse_from(["pantry_planner", "compare", "--list", "l.json", &format!("--fallback-price={}", price)])
        };
        match parse("1.75").unwrap().command {
            Command::Compare { fallback_price, .. } => assert_eq!(fallback_price, Some(1.75)),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(parse("0").is_ok());
        assert!(parse("-1").is_err());
        assert!(parse("NaN").is_err());
        assert!(parse("inf").is_err());
        assert!(parse("cheap").is_err());
    }

    #[test]
    fn parses_steps_amendment() {
        let cli = Cli::try_parse_from(["pantry_planner", "steps", "-r", "r.json", "--amend", "make it spicier"]).unwrap();
        assert!(matches!(cli.command, Command::Steps { amend: Some(ref a), .. } if a == "make it spicier"));
    }
}
