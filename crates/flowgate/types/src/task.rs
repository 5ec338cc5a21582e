//! Task trees and the system task-type allow-list
//!
//! A workflow definition is a tree: decision tasks branch into per-case task
//! lists, fork tasks into parallel lists. The gateway walks the whole tree
//! twice per write -- once to enforce the type allow-list, once to rewrite
//! names -- so traversal is centralized here as a tagged-union visitor
//! instead of ad hoc type-string checks at every call site.

use crate::errors::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task types a tenant definition may use
///
/// Everything outside this list (notably inline/scripted types) would let a
/// definition execute code paths the gateway cannot tenant-scope, so the
/// check runs recursively before any name is rewritten.
pub const SYSTEM_TASK_TYPES: &[&str] = &[
    "SIMPLE",
    "DECISION",
    "SWITCH",
    "DYNAMIC",
    "FORK_JOIN",
    "FORK_JOIN_DYNAMIC",
    "JOIN",
    "EXCLUSIVE_JOIN",
    "SUB_WORKFLOW",
    "EVENT",
    "WAIT",
    "HTTP",
    "DO_WHILE",
    "SET_VARIABLE",
    "TERMINATE",
    "KAFKA_PUBLISH",
];

/// Reference to a sub-workflow started by a SUB_WORKFLOW task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubWorkflowParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One node of a workflow task tree
///
/// Fields the gateway never rewrites ride along in `extra` so the document
/// reaches the backend byte-equivalent apart from the rewritten names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_reference_name: Option<String>,

    #[serde(rename = "type")]
    pub task_type: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub decision_cases: BTreeMap<String, Vec<Task>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_case: Vec<Task>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fork_tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_param: Option<SubWorkflowParams>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Structural view of one task's children
pub enum TaskBranches<'a> {
    Simple,
    Decision {
        cases: &'a BTreeMap<String, Vec<Task>>,
        default_case: &'a [Task],
    },
    Fork {
        branches: &'a [Task],
    },
}

impl Task {
    /// Classify this task's nested structure
    ///
    /// The type string is consulted exactly once, here; everything that
    /// walks the tree matches on the returned variant.
    pub fn branches(&self) -> TaskBranches<'_> {
        match self.task_type.as_str() {
            "DECISION" | "SWITCH" => TaskBranches::Decision {
                cases: &self.decision_cases,
                default_case: &self.default_case,
            },
            "FORK_JOIN" | "FORK_JOIN_DYNAMIC" => TaskBranches::Fork {
                branches: &self.fork_tasks,
            },
            _ => TaskBranches::Simple,
        }
    }
}

/// Enforce the system task-type allow-list over a whole tree
///
/// Fails on the first disallowed type at any nesting depth, before any
/// caller has had the chance to mutate a name.
pub fn validate_task_types(tasks: &[Task]) -> GatewayResult<()> {
    for task in tasks {
        if !SYSTEM_TASK_TYPES.contains(&task.task_type.as_str()) {
            return Err(GatewayError::DisallowedTaskType(task.task_type.clone()));
        }
        match task.branches() {
            TaskBranches::Simple => {}
            TaskBranches::Decision { cases, default_case } => {
                for case_tasks in cases.values() {
                    validate_task_types(case_tasks)?;
                }
                validate_task_types(default_case)?;
            }
            TaskBranches::Fork { branches } => validate_task_types(branches)?,
        }
    }
    Ok(())
}

/// Apply `f` to every task name and sub-workflow name in the tree
///
/// Used by the metadata transformers to prefix or strip names in one pass.
/// Stops at the first error so a failed walk leaves no partial mutation
/// behind the failure point unobserved by the caller.
pub fn visit_names_mut<F>(tasks: &mut [Task], f: &mut F) -> GatewayResult<()>
where
    F: FnMut(&mut String) -> GatewayResult<()>,
{
    for task in tasks {
        f(&mut task.name)?;
        if let Some(sub) = task.sub_workflow_param.as_mut() {
            f(&mut sub.name)?;
        }
        // Recurse structurally rather than via branches() so a malformed
        // tree cannot smuggle an unvisited name in an unexpected container.
        for case_tasks in task.decision_cases.values_mut() {
            visit_names_mut(case_tasks, f)?;
        }
        visit_names_mut(&mut task.default_case, f)?;
        visit_names_mut(&mut task.fork_tasks, f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(name: &str, task_type: &str) -> Task {
        Task {
            name: name.to_string(),
            task_reference_name: Some(format!("{}_ref", name)),
            task_type: task_type.to_string(),
            decision_cases: BTreeMap::new(),
            default_case: Vec::new(),
            fork_tasks: Vec::new(),
            sub_workflow_param: None,
            extra: serde_json::Map::new(),
        }
    }

    fn decision_with(case_task: Task) -> Task {
        let mut decision = simple("route", "DECISION");
        decision.decision_cases.insert("a".to_string(), vec![case_task]);
        decision
    }

    #[test]
    fn test_flat_allow_list() {
        assert!(validate_task_types(&[simple("t1", "SIMPLE")]).is_ok());
        assert!(matches!(
            validate_task_types(&[simple("t1", "INLINE")]),
            Err(GatewayError::DisallowedTaskType(t)) if t == "INLINE"
        ));
    }

    #[test]
    fn test_disallowed_type_inside_decision_case() {
        let tree = vec![decision_with(simple("bad", "INLINE"))];
        assert!(matches!(
            validate_task_types(&tree),
            Err(GatewayError::DisallowedTaskType(_))
        ));
    }

    #[test]
    fn test_disallowed_type_inside_fork_branch() {
        let mut fork = simple("split", "FORK_JOIN");
        fork.fork_tasks = vec![decision_with(simple("bad", "LAMBDA"))];
        assert!(matches!(
            validate_task_types(&[fork]),
            Err(GatewayError::DisallowedTaskType(t)) if t == "LAMBDA"
        ));
    }

    #[test]
    fn test_default_case_is_checked() {
        let mut decision = simple("route", "SWITCH");
        decision.default_case = vec![simple("bad", "INLINE")];
        assert!(validate_task_types(&[decision]).is_err());
    }

    #[test]
    fn test_visit_names_reaches_nested_and_subworkflow() {
        let mut sub = simple("child", "SUB_WORKFLOW");
        sub.sub_workflow_param = Some(SubWorkflowParams {
            name: "inner".to_string(),
            version: None,
            extra: serde_json::Map::new(),
        });
        let mut tree = vec![decision_with(sub)];

        let mut seen = Vec::new();
        visit_names_mut(&mut tree, &mut |name| {
            seen.push(name.clone());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["route", "child", "inner"]);
    }

    #[test]
    fn test_serde_wire_shape() {
        let raw = r#"{
            "name": "route",
            "taskReferenceName": "route_ref",
            "type": "DECISION",
            "decisionCases": {"yes": [{"name": "t", "type": "SIMPLE", "retryCount": 3}]},
            "caseValueParam": "flag"
        }"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.task_type, "DECISION");
        assert_eq!(task.decision_cases["yes"][0].extra["retryCount"], 3);
        assert_eq!(task.extra["caseValueParam"], "flag");

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["decisionCases"]["yes"][0]["retryCount"], 3);
    }
}
