use serde::Serialize;

/// Static description a trigger registers with the host.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TriggerDefinition {
    pub key: &'static str,
    pub noun: &'static str,
    pub display: TriggerDisplay,
    /// The trigger takes part in the host's page-at-a-time pull model.
    #[serde(rename = "canPaginate")]
    pub can_paginate: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TriggerDisplay {
    pub label: &'static str,
    /// Hidden triggers only feed dropdowns and never start an automation.
    pub hidden: bool,
    pub description: &'static str,
}
