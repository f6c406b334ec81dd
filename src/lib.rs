pub mod api_connection;
pub mod assistant;
pub mod categorization;
pub mod cli;
pub mod config;
pub mod logging;
pub mod matching;
pub mod meal_plan;
pub mod model;
pub mod nutrition;
pub mod pantry;
pub mod price_catalog;
pub mod price_comparison;
pub mod response_parser;
pub mod shopping_list;
pub mod units;
