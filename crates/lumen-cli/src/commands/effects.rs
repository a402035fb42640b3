//! Effect class listing and information command.

use clap::Args;
use lumen_core::ParamSpec;
use lumen_registry::EffectCategory;

use super::common::offline_registry;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show details for a specific effect class
    #[arg(value_name = "CLASS")]
    class: Option<String>,
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    let registry = offline_registry(100);

    if let Some(class) = &args.class {
        let descriptor = registry
            .get(class)
            .ok_or_else(|| anyhow::anyhow!("Unknown effect class: {}", class))?;

        println!("{} ({})", descriptor.name, descriptor.id);
        println!("{}", "=".repeat(descriptor.name.len() + descriptor.id.len() + 3));
        println!();
        println!("{}", descriptor.description);
        println!("Category: {}", descriptor.category.name());
        println!();

        let schema = registry
            .schema(class)
            .ok_or_else(|| anyhow::anyhow!("No schema for class: {}", class))?;
        if schema.is_empty() {
            println!("No parameters.");
            return Ok(());
        }

        println!("Parameters:");
        println!();
        println!("  {:16}  {:12}  {}", "Name", "Default", "Range");
        println!("  {:16}  {:12}  {}", "----", "-------", "-----");
        for (name, spec) in schema.iter() {
            let (default, range) = describe(spec);
            println!("  {:16}  {:12}  {}", name, default, range);
        }
        return Ok(());
    }

    println!("Available Effect Classes");
    println!("========================\n");

    for category in [
        EffectCategory::Source,
        EffectCategory::Analysis,
        EffectCategory::Pixel,
        EffectCategory::Color,
        EffectCategory::Output,
    ] {
        let classes = registry.classes_in_category(category);
        if classes.is_empty() {
            continue;
        }
        println!("{}:", category.name());
        for descriptor in classes {
            println!("  {:16}  {}", descriptor.id, descriptor.description);
        }
        println!();
    }

    println!("Details: lumen effects <CLASS>");
    Ok(())
}

fn describe(spec: &ParamSpec) -> (String, String) {
    match spec {
        ParamSpec::Number {
            default, min, max, ..
        } => (default.to_string(), format!("{min}..{max}")),
        ParamSpec::Choice { choices, default } => ((*default).to_string(), choices.join(" | ")),
        ParamSpec::Bool { default } => (default.to_string(), "true | false".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_covers_every_spec_kind() {
        let number = ParamSpec::Number {
            default: 2.0,
            min: 0.0,
            max: 10.0,
            step: 0.1,
        };
        assert_eq!(describe(&number), ("2".to_string(), "0..10".to_string()));

        let choice = ParamSpec::Choice {
            choices: &["add", "multiply"],
            default: "add",
        };
        assert_eq!(
            describe(&choice),
            ("add".to_string(), "add | multiply".to_string())
        );
    }
}
