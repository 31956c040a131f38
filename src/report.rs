//! Text formatting of production chain results

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{MachineNode, ProductionChainResult, ProductionStage};

pub fn format_rate(rate: f64) -> String {
    if rate < 1.0 {
        format!("{rate:.3}/min")
    } else if rate < 10.0 {
        format!("{rate:.2}/min")
    } else if rate < 100.0 {
        format!("{rate:.1}/min")
    } else {
        format!("{rate:.0}/min")
    }
}

pub fn format_machine_count(count: f64) -> String {
    if count < 0.01 {
        "< 0.01".to_string()
    } else if count < 1.0 {
        format!("{count:.2}")
    } else if count % 1.0 < 0.01 {
        format!("{}", (count + 0.5).floor() as u64)
    } else {
        format!("{count:.2}")
    }
}

/// Power in MW, shown in kW below 1 MW.
pub fn format_power(power: f64) -> String {
    if power < 1.0 {
        format!("{:.0} kW", power * 1000.0)
    } else if power < 10.0 {
        format!("{power:.2} MW")
    } else if power < 100.0 {
        format!("{power:.1} MW")
    } else {
        format!("{power:.0} MW")
    }
}

pub fn tier_name(tier: u32) -> String {
    let name = match tier {
        0 => "Tier 0 - HUB Upgrade 1",
        1 => "Tier 1 - Field Research",
        2 => "Tier 2 - Part Assembly",
        3 => "Tier 3 - Basic Steel Production",
        4 => "Tier 4 - Advanced Steel Production",
        5 => "Tier 5 - Oil Processing",
        6 => "Tier 6 - Industrial Manufacturing",
        7 => "Tier 7 - Bauxite Refinement",
        8 => "Tier 8 - Nuclear Power",
        _ => return format!("Tier {tier}"),
    };
    name.to_string()
}

/// Group nodes by machine type, in order of first appearance.
pub fn group_into_stages(nodes: &[MachineNode]) -> Vec<ProductionStage> {
    let mut stages: Vec<ProductionStage> = Vec::new();
    for node in nodes {
        match stages.iter_mut().find(|s| s.stage_name == node.machine_type) {
            Some(stage) => stage.nodes.push(node.clone()),
            None => stages.push(ProductionStage {
                stage_number: stages.len() + 1,
                stage_name: node.machine_type.clone(),
                nodes: vec![node.clone()],
            }),
        }
    }
    stages
}

/// Format a production chain as an indented tree starting at the target.
pub fn format_production_chain(result: &ProductionChainResult) -> String {
    let by_item: HashMap<&str, &MachineNode> = result
        .nodes
        .iter()
        .map(|n| (n.item_produced.as_str(), n))
        .collect();

    let mut output = String::new();
    let Some(root) = by_item.get(result.target_item_id.as_str()) else {
        return output;
    };

    let mut shown: HashSet<&str> = HashSet::new();
    // (node, indent)
    let mut stack = vec![(*root, 0usize)];
    while let Some((node, indent)) = stack.pop() {
        let prefix = "  ".repeat(indent);
        if !shown.insert(node.node_id.as_str()) {
            output.push_str(&format!("{prefix}{} (see above)\n", node.item_produced_name));
            continue;
        }

        let alternate = if node.is_alternate { ", alternate" } else { "" };
        output.push_str(&format!(
            "{prefix}{}x {} [{}{}] -> {} {} ({})\n",
            format_machine_count(node.machine_count),
            node.machine_type,
            node.recipe_name,
            alternate,
            format_rate(node.target_rate),
            node.item_produced_name,
            format_power(node.total_power),
        ));

        // pushed in reverse so inputs print in recipe order
        for input in node.inputs.iter().rev() {
            match by_item.get(input.item_id.as_str()) {
                Some(upstream) => stack.push((*upstream, indent + 2)),
                None => output.push_str(&format!(
                    "{prefix}  needs {} @ {} (raw input)\n",
                    input.item_name,
                    format_rate(input.rate)
                )),
            }
        }
    }

    output
}

/// Summary block with totals and raw resource needs.
pub fn format_summary(result: &ProductionChainResult) -> String {
    let mut lines = vec![
        "=== Production Summary ===".to_string(),
        format!(
            "Target: {:.1} {}/min ({})",
            result.target_rate, result.target_item_name, result.status
        ),
        format!("Objective: {}", result.optimization_objective),
        format!("Total Machines: {}", result.total_machines),
        format!("Total Power: {}", format_power(result.total_power)),
        format!("Raw Resources: {} types", result.total_raw_resources),
    ];

    if !result.raw_resources.is_empty() {
        lines.push(String::new());
        lines.push("Raw Resource Requirements:".to_string());
        for raw in &result.raw_resources {
            lines.push(format!("  {}: {}", raw.item_name, format_rate(raw.rate)));
        }
    }

    let sections = [
        ("Messages", &result.messages),
        ("Warnings", &result.warnings),
        ("Missing recipes", &result.missing_recipes),
    ];
    for (title, entries) in sections {
        if !entries.is_empty() {
            lines.push(String::new());
            lines.push(format!("{title}:"));
            lines.extend(entries.iter().map(|e| format!("  {e}")));
        }
    }

    lines.join("\n")
}

/// Machine type breakdown.
pub fn format_stages(result: &ProductionChainResult) -> String {
    let mut output = String::new();
    for stage in group_into_stages(&result.nodes) {
        output.push_str(&format!(
            "{}. {}: {} machines, {}\n",
            stage.stage_number,
            stage.stage_name,
            stage.total_machines(),
            format_power(stage.total_power())
        ));
    }
    output
}

/// Recipe ids grouped by unlock tier.
pub fn recipes_by_tier<'a>(recipes: impl IntoIterator<Item = (u32, &'a str)>) -> BTreeMap<u32, Vec<&'a str>> {
    let mut tiers: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
    for (tier, id) in recipes {
        tiers.entry(tier).or_default().push(id);
    }
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{SolveOptions, calculate_production_chain};
    use crate::sample;

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.5), "0.500/min");
        assert_eq!(format_rate(5.0), "5.00/min");
        assert_eq!(format_rate(50.0), "50.0/min");
        assert_eq!(format_rate(500.0), "500/min");
    }

    #[test]
    fn test_format_machine_count() {
        assert_eq!(format_machine_count(0.001), "< 0.01");
        assert_eq!(format_machine_count(0.3), "0.30");
        assert_eq!(format_machine_count(3.001), "3");
        assert_eq!(format_machine_count(2.5), "2.50");
    }

    #[test]
    fn test_format_power() {
        assert_eq!(format_power(0.4), "400 kW");
        assert_eq!(format_power(4.5), "4.50 MW");
        assert_eq!(format_power(45.0), "45.0 MW");
        assert_eq!(format_power(450.0), "450 MW");
    }

    #[test]
    fn test_tier_names() {
        assert_eq!(tier_name(3), "Tier 3 - Basic Steel Production");
        assert_eq!(tier_name(12), "Tier 12");
    }

    #[test]
    fn test_chain_tree_and_stages() {
        let catalog = sample::catalog();
        let unlocked = sample::all_recipe_ids().into_iter().collect();
        let result = calculate_production_chain(&catalog, "iron_plate", 60.0, &unlocked, &SolveOptions::default());

        let tree = format_production_chain(&result);
        let lines: Vec<_> = tree.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("0.30x Constructor [Iron Plate]"));
        assert!(lines[1].starts_with("    0.10x Smelter [Iron Ingot]"));
        assert!(lines[2].contains("needs Iron Ore @ 90.0/min (raw input)"));
        assert!(tree.ends_with('\n'));

        assert_eq!(
            format_stages(&result),
            "1. Smelter: 1 machines, 400 kW\n2. Constructor: 1 machines, 1.20 MW\n"
        );

        let stages = group_into_stages(&result.nodes);
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].stage_name, "Smelter");
        assert_eq!(stages[1].total_machines(), 1);

        let summary = format_summary(&result);
        assert!(summary.contains("Total Machines: 2"));
        assert!(summary.contains("Iron Ore: 90.0/min"));
    }

    #[test]
    fn test_recipes_by_tier() {
        let tiers = recipes_by_tier([(1, "rotor"), (0, "screw"), (1, "smart_plating")]);
        assert_eq!(tiers[&0], vec!["screw"]);
        assert_eq!(tiers[&1], vec!["rotor", "smart_plating"]);
    }
}
