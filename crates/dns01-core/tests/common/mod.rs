//! Test doubles and common utilities for hook contract tests
//!
//! The doubles keep just enough state to observe what the hook does:
//! a registrar with staged/committed records and a DNS backend that
//! answers from scripts and logs every query.

#![allow(dead_code)]

use dns01_core::error::{Error, Result};
use dns01_core::traits::{DnsLookup, Registrar};
use dns01_core::{TxtRecord, Zone};
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

/// A change staged but not yet committed
#[derive(Debug, Clone)]
enum StagedChange {
    Add(TxtRecord),
    Delete(String),
}

#[derive(Debug, Default)]
struct RegistrarState {
    zones: Vec<Zone>,
    committed: Vec<TxtRecord>,
    staged: Vec<StagedChange>,
    next_id: usize,
    list_zones_calls: usize,
    add_calls: usize,
    delete_calls: usize,
    commit_calls: usize,
    failing: HashSet<&'static str>,
}

/// An in-memory registrar with two-phase (staged → committed) semantics
pub struct MockRegistrar {
    state: Arc<Mutex<RegistrarState>>,
}

impl MockRegistrar {
    /// Create a registrar managing `zones`
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistrarState {
                zones,
                next_id: 1000,
                ..RegistrarState::default()
            })),
        }
    }

    /// Create a MockRegistrar that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
        }
    }

    /// Put a committed TXT record in place, returning its id
    pub fn seed_record(&self, name: &str, value: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id.to_string();
        state.next_id += 1;
        state.committed.push(TxtRecord {
            id: id.clone(),
            name: name.to_string(),
            record_type: "TXT".to_string(),
            value: value.to_string(),
        });
        id
    }

    /// Make an operation fail ("list_zones", "add", "list", "delete", "commit")
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    /// Records visible after the last commit
    pub fn committed_records(&self) -> Vec<TxtRecord> {
        self.state.lock().unwrap().committed.clone()
    }

    /// Number of changes waiting for a commit
    pub fn staged_count(&self) -> usize {
        self.state.lock().unwrap().staged.len()
    }

    pub fn list_zones_calls(&self) -> usize {
        self.state.lock().unwrap().list_zones_calls
    }

    pub fn add_calls(&self) -> usize {
        self.state.lock().unwrap().add_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }

    pub fn commit_calls(&self) -> usize {
        self.state.lock().unwrap().commit_calls
    }

    fn check(&self, state: &RegistrarState, operation: &'static str, zone: &Zone) -> Result<()> {
        if state.failing.contains(operation) {
            return Err(Error::registrar(&zone.service, operation, "HTTP 500"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Registrar for MockRegistrar {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let mut state = self.state.lock().unwrap();
        state.list_zones_calls += 1;
        if state.failing.contains("list_zones") {
            return Err(Error::zone_discovery("HTTP 500"));
        }
        Ok(state.zones.clone())
    }

    async fn add_txt_record(&self, zone: &Zone, fqdn: &str, value: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.add_calls += 1;
        self.check(&state, "add", zone)?;

        let id = state.next_id.to_string();
        state.next_id += 1;
        state.staged.push(StagedChange::Add(TxtRecord {
            id: id.clone(),
            name: fqdn.to_string(),
            record_type: "TXT".to_string(),
            value: value.to_string(),
        }));
        Ok(id)
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<TxtRecord>> {
        let state = self.state.lock().unwrap();
        self.check(&state, "list", zone)?;
        Ok(state.committed.clone())
    }

    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        self.check(&state, "delete", zone)?;
        state.staged.push(StagedChange::Delete(record_id.to_string()));
        Ok(())
    }

    async fn commit(&self, zone: &Zone) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.commit_calls += 1;
        self.check(&state, "commit", zone)?;

        let staged = std::mem::take(&mut state.staged);
        for change in staged {
            match change {
                StagedChange::Add(record) => state.committed.push(record),
                StagedChange::Delete(id) => state.committed.retain(|r| r.id != id),
            }
        }
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        "mock"
    }
}

/// A DNS query observed by [`ScriptedLookup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Ns(String),
    A(String),
    Txt(IpAddr, String),
}

/// One scripted TXT answer
#[derive(Debug, Clone)]
pub enum TxtAnswer {
    /// Server answers with these strings (empty = no record)
    Values(Vec<String>),
    /// Query errors or times out
    Fail,
}

impl TxtAnswer {
    pub fn none() -> Self {
        TxtAnswer::Values(Vec::new())
    }

    pub fn value(value: &str) -> Self {
        TxtAnswer::Values(vec![value.to_string()])
    }
}

#[derive(Debug, Default)]
struct LookupState {
    ns: HashMap<String, Vec<String>>,
    ns_failures: HashSet<String>,
    a: HashMap<String, Vec<Ipv4Addr>>,
    txt_scripts: HashMap<IpAddr, Vec<TxtAnswer>>,
    txt_calls: HashMap<IpAddr, usize>,
    log: Vec<Query>,
}

/// A DNS backend answering from scripts
///
/// TXT scripts are consumed one entry per query to that server; the last
/// entry repeats once the script runs out. Servers without a script have
/// no record.
pub struct ScriptedLookup {
    state: Arc<Mutex<LookupState>>,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LookupState::default())),
        }
    }

    /// Create a ScriptedLookup that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
        }
    }

    /// NS answer for an absolute name
    pub fn with_ns(self, name: &str, hosts: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .ns
            .insert(name.to_string(), hosts.iter().map(|h| h.to_string()).collect());
        self
    }

    /// NS lookup for an absolute name errors
    pub fn with_failing_ns(self, name: &str) -> Self {
        self.state.lock().unwrap().ns_failures.insert(name.to_string());
        self
    }

    /// A answer for a nameserver host
    pub fn with_a(self, host: &str, addrs: &[[u8; 4]]) -> Self {
        self.state
            .lock()
            .unwrap()
            .a
            .insert(host.to_string(), addrs.iter().map(|a| Ipv4Addr::from(*a)).collect());
        self
    }

    /// TXT answers for a server, one per round
    pub fn with_txt_script(self, server: [u8; 4], script: Vec<TxtAnswer>) -> Self {
        self.state
            .lock()
            .unwrap()
            .txt_scripts
            .insert(IpAddr::from(server), script);
        self
    }

    /// Every query made so far, in order
    pub fn queries(&self) -> Vec<Query> {
        self.state.lock().unwrap().log.clone()
    }

    /// Number of TXT queries sent to `server`
    pub fn txt_queries_to(&self, server: [u8; 4]) -> usize {
        let server = IpAddr::from(server);
        self.queries()
            .iter()
            .filter(|q| matches!(q, Query::Txt(ip, _) if *ip == server))
            .count()
    }
}

#[async_trait::async_trait]
impl DnsLookup for ScriptedLookup {
    async fn nameservers(&self, name: &str) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Query::Ns(name.to_string()));
        if state.ns_failures.contains(name) {
            return Err(Error::dns(format!("timeout querying NS for {name}")));
        }
        Ok(state.ns.get(name).cloned().unwrap_or_default())
    }

    async fn ipv4_addrs(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Query::A(host.to_string()));
        match state.a.get(host) {
            Some(addrs) => Ok(addrs.clone()),
            None => Err(Error::dns(format!("no A record for {host}"))),
        }
    }

    async fn txt_at(&self, server: IpAddr, name: &str) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Query::Txt(server, name.to_string()));

        let call = {
            let calls = state.txt_calls.entry(server).or_insert(0);
            *calls += 1;
            *calls - 1
        };

        let answer = match state.txt_scripts.get(&server) {
            Some(script) if !script.is_empty() => script[call.min(script.len() - 1)].clone(),
            _ => TxtAnswer::none(),
        };

        match answer {
            TxtAnswer::Values(values) => Ok(values),
            TxtAnswer::Fail => Err(Error::dns(format!("timeout querying {server}"))),
        }
    }
}

/// The zone most tests use
pub fn example_zone() -> Zone {
    Zone::new("EXAMPLE-SVC", "example.com")
}

/// Propagation settings: 5 s between rounds (tests run on a paused clock)
pub fn propagation_config(max_rounds: usize) -> dns01_core::PropagationConfig {
    dns01_core::PropagationConfig {
        enabled: true,
        max_rounds,
        poll_interval_secs: 5,
    }
}
