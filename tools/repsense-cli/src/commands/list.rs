//! List catalog exercises.

use repsense_common::config::AppConfig;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = super::load_catalog(config)?;

    match &config.catalog_path {
        Some(path) => println!("Catalog: {}", path.display()),
        None => println!("Catalog: built-in"),
    }
    println!("{} exercise(s)", catalog.len());
    println!();

    for def in catalog.iter() {
        let logic = &def.counting_logic;
        println!("{} ({})", def.exercise_id, def.name);
        println!("  Counting: {} on '{}'", logic.kind, logic.count_on);
        if let Some(duration) = logic.duration {
            println!("  Hold: {duration}s");
        }
        println!("  Requires: {}", logic.requirements.join(", "));
        if let Some(difficulty) = def.difficulty {
            println!("  Difficulty: {difficulty:?}");
        }
        if !def.muscle_groups.is_empty() {
            println!("  Muscles: {}", def.muscle_groups.join(", "));
        }
        println!("  Calories: {}", def.calorie_formula.formula);
    }

    Ok(())
}
