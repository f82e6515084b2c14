//! Result formatter: flat triples to a category tree
//!
//! Pure; no I/O and no clock. Each triple's method is mapped to a category,
//! unmapped triples are dropped, and items get per-category ordinal ids in
//! triple order. Every declared category is emitted, empty or not, ordered
//! by id.

use std::cmp::Ordering;

use crate::executor::StepOutput;
use crate::report::{
    lookup, Category, CategoryConfig, ContentItem, GroupingConfig, MethodCategoryMapping, Payload,
};
use crate::table::TableResult;

pub fn format(
    triples: &[StepOutput],
    category_config: &CategoryConfig,
    method_category_mapping: &MethodCategoryMapping,
    grouping_config: &GroupingConfig,
) -> Vec<Category> {
    let mut categories: Vec<Category> = category_config
        .categories
        .iter()
        .map(|def| Category {
            id: def.id.clone(),
            title: def.title.clone(),
            content: Vec::new(),
        })
        .collect();

    for triple in triples {
        let Some(category_id) = lookup(method_category_mapping, &triple.step, &triple.method) else {
            continue;
        };

        let index = match categories.iter().position(|c| &c.id == category_id) {
            Some(index) => index,
            None => {
                categories.push(Category {
                    id: category_id.clone(),
                    title: category_id.clone(),
                    content: Vec::new(),
                });
                categories.len() - 1
            }
        };

        let category = &mut categories[index];
        let id = format!("{}.{}", category.id, category.content.len() + 1);
        let title = lookup(&category_config.titles, &triple.step, &triple.method)
            .cloned()
            .unwrap_or_else(|| triple.method.clone());
        let group_column = lookup(grouping_config, &triple.step, &triple.method);

        category.content.push(content_item(id, title, &triple.result, group_column));
    }

    categories.sort_by(|a, b| compare_ids(&a.id, &b.id));
    categories
}

fn content_item(
    id: String,
    title: String,
    result: &TableResult,
    group_column: Option<&String>,
) -> ContentItem {
    let partitions = match (result, group_column) {
        (TableResult::Found(table), Some(column)) => table.partition_by(column),
        _ => None,
    };

    let payload = match partitions {
        Some(parts) if parts.len() > 1 => Payload::Content(
            parts
                .into_iter()
                .enumerate()
                .map(|(k, (key, table))| ContentItem {
                    id: format!("{}.{}", id, k + 1),
                    title: key,
                    payload: Payload::Data(TableResult::Found(table)),
                })
                .collect(),
        ),
        _ => Payload::Data(result.clone()),
    };

    ContentItem { id, title, payload }
}

/// Dotted ids compare segment-wise, numerically where both segments are numbers
fn compare_ids(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
