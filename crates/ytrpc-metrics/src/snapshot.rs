// Copyright 2025 ytrpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Requests sent to a specific endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointMetrics {
    pub endpoint_addr: String,
    pub request_count: u64,
}

impl EndpointMetrics {
    pub fn new(endpoint_addr: String) -> Self {
        Self {
            endpoint_addr,
            request_count: 0,
        }
    }
}

/// Point-in-time copy of the balancing counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalancingSnapshot {
    pub inflight: u64,
    pub failover: u64,
    pub total: u64,
    pub uptime_ms: u64,
    pub endpoints: HashMap<String, EndpointMetrics>,
}

impl BalancingSnapshot {
    pub fn new(uptime_ms: u64) -> Self {
        Self {
            inflight: 0,
            failover: 0,
            total: 0,
            uptime_ms,
            endpoints: HashMap::new(),
        }
    }
}
