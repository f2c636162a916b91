//! Templates command handler.

use anyhow::Result;
use mcpvisor_core::Template;

use crate::bootstrap::CliContext;
use crate::presentation::{print_separator, truncate_string};

/// Print the built-in templates, optionally restricted to one category.
pub fn execute(ctx: &CliContext, category: Option<&str>) -> Result<()> {
    let catalog = ctx.catalog();
    let templates: Vec<&Template> = match category {
        Some(category) => catalog.by_category(category).collect(),
        None => catalog.all().iter().collect(),
    };

    if templates.is_empty() {
        println!("No templates in this category.");
        println!("Categories: {}", catalog.categories().join(", "));
        return Ok(());
    }

    println!("{:<14} {:<20} {:<12} Description", "ID", "Name", "Category");
    print_separator(100);
    for template in templates {
        println!(
            "{:<14} {:<20} {:<12} {}",
            template.id,
            truncate_string(&template.name, 19),
            truncate_string(&template.category, 11),
            template.description
        );
        for var in template.env_vars.iter().filter(|v| v.required) {
            println!("{:<14} requires {}", "", var.name);
        }
    }

    Ok(())
}
