//! The parameter registry state machine
//!
//! One `ParamRegistry` instance is constructed at process start and wrapped
//! by the firmware in an `embassy_sync::mutex::Mutex`; every operation here
//! runs under that outer lock. Transport calls are enqueue-style, so the
//! lock is never held across network I/O, and bulk loops yield between
//! entries so connect/disconnect handling can interleave.
//!
//! Value-cell writes go through [`ParamCell`](crate::value::ParamCell),
//! which carries its own narrow critical section for readers that bypass
//! the registry lock entirely.

use heapless::{String, Vec};

use super::entry::{EntryFlags, ParamEntry, RegisterRequest};
use super::groups::GroupTree;
use super::topics::{self, TopicString};
use super::{ChangeMode, EntryId, GroupId, ParamKind, RegistryConfig, MAX_ENTRIES, MAX_NAME_LEN};
use crate::control::SystemControl;
use crate::error::{ParamsError, Result, TransportError};
use crate::mqtt::MqttInterface;
use crate::notify::{EntryInfo, Notifier};
use crate::storage::ParamStore;
use crate::value::{ParamLimits, ParamValue};

/// Central registry: group tree + ordered entry list + collaborators
pub struct ParamRegistry<M, S, C, N>
where
    M: MqttInterface,
    S: ParamStore,
    C: SystemControl,
    N: Notifier,
{
    cfg: RegistryConfig,
    mqtt: M,
    store: S,
    control: C,
    notifier: N,
    groups: GroupTree,
    entries: Vec<ParamEntry, MAX_ENTRIES>,
    /// Shared wildcard subscription topic, when wildcard mode is active
    wildcard: Option<TopicString>,
    /// Broker role seen at the last open; role changes force a resubscribe
    primary: Option<bool>,
}

impl<M, S, C, N> ParamRegistry<M, S, C, N>
where
    M: MqttInterface,
    S: ParamStore,
    C: SystemControl,
    N: Notifier,
{
    /// Create an empty registry
    pub fn new(cfg: RegistryConfig, mqtt: M, store: S, control: C, notifier: N) -> Self {
        Self {
            cfg,
            mqtt,
            store,
            control,
            notifier,
            groups: GroupTree::new(),
            entries: Vec::new(),
            wildcard: None,
            primary: None,
        }
    }

    /// Registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.cfg
    }

    /// Transport client
    pub fn mqtt(&self) -> &M {
        &self.mqtt
    }

    /// Transport client, mutable (connection-state scripting in tests)
    pub fn mqtt_mut(&mut self) -> &mut M {
        &mut self.mqtt
    }

    /// Persistent store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persistent store, mutable
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Control sink
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Notification sink
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Group tree (read-only)
    pub fn groups(&self) -> &GroupTree {
        &self.groups
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by id
    pub fn entry(&self, id: EntryId) -> Option<&ParamEntry> {
        self.entries.get(id.0)
    }

    /// Find an entry by (group, key), case-insensitive on the key
    pub fn find(&self, group: Option<GroupId>, key: &str) -> Option<EntryId> {
        self.entries
            .iter()
            .position(|e| e.group == group && e.key.eq_ignore_ascii_case(key))
            .map(EntryId)
    }

    /// Get or create a namespace group
    pub fn group(
        &mut self,
        parent: Option<GroupId>,
        key: &'static str,
        topic: &'static str,
        friendly: &'static str,
    ) -> Result<GroupId> {
        self.groups
            .get_or_create(parent, key, topic, friendly, self.cfg.max_group_key_len)
    }

    /// Register the built-in OTA and command endpoints
    ///
    /// Keys come from the configuration; an empty key disables that endpoint.
    pub fn register_system_entries(&mut self) -> Result<()> {
        if !self.cfg.ota_key.is_empty() {
            let qos = self.cfg.system_qos;
            self.register(RegisterRequest::ota(self.cfg.ota_key).with_qos(qos))?;
        }
        if !self.cfg.command_key.is_empty() {
            let qos = self.cfg.system_qos;
            self.register(RegisterRequest::command(self.cfg.command_key).with_qos(qos))?;
        }
        Ok(())
    }

    /// Register an entry (get-or-create on (group, key))
    ///
    /// On first creation of a persisted kind the value cell is overwritten
    /// from the store; if the restored value differs from the in-memory
    /// default, the handler fires with [`ChangeMode::NvsRestored`] and the
    /// notifier is told. If the transport is connected the entry is
    /// provisioned immediately, otherwise it waits for the next bulk open.
    pub fn register(&mut self, req: RegisterRequest) -> Result<EntryId> {
        if req.key.is_empty() {
            crate::log_warn!("Registering entry with empty key; it cannot be looked up");
        }

        if let Some(id) = self.find(req.group, req.key) {
            crate::log_debug!("Entry \"{}\" already registered", req.key);
            return Ok(id);
        }

        let qos = req.qos.unwrap_or(match req.kind {
            ParamKind::Command | ParamKind::Ota => self.cfg.system_qos,
            _ => self.cfg.default_qos,
        });
        let mut flags = EntryFlags::empty();
        if req.notify {
            flags |= EntryFlags::NOTIFY;
        }

        self.entries
            .push(ParamEntry {
                kind: req.kind,
                value_type: req.value_type,
                handler: req.handler,
                group: req.group,
                key: req.key,
                friendly: req.friendly,
                qos,
                cell: req.cell,
                limits: None,
                topic: None,
                confirm: None,
                flags,
            })
            .map_err(|_| ParamsError::RegistryFull)?;
        let id = EntryId(self.entries.len() - 1);

        if req.kind.persisted() {
            self.restore_from_store(id);
        }

        if req.kind.value_bearing() {
            if let Some(cell) = req.cell {
                let text = cell.get().encode();
                crate::log_debug!(
                    "Parameter \"{}.{}\": [{}] registered",
                    self.groups.key_of(req.group),
                    req.key,
                    text.as_str()
                );
            }
        } else {
            crate::log_debug!("System handler \"{}\" registered", req.key);
        }

        // Provision now if the broker is already there
        if self.mqtt.is_connected() {
            if self.confirm_allowed(req.kind) {
                let _ = self.publish_confirm(id, false);
            }
            self.subscribe_entry(id.0);
        }

        Ok(id)
    }

    /// Overwrite the value cell from persistent storage at registration
    fn restore_from_store(&mut self, id: EntryId) {
        let idx = id.0;
        let Some(cell) = self.entries[idx].cell else {
            return;
        };
        let key = self.entries[idx].key;
        let value_type = self.entries[idx].value_type;
        let group_key = self.group_key_copy(self.entries[idx].group);

        let snapshot = cell.get();
        let Some(stored) = self.store.read(&group_key, key, value_type) else {
            return;
        };
        cell.set(stored.clone());

        if stored != snapshot {
            let text = stored.encode();
            crate::log_info!(
                "Parameter \"{}.{}\" restored from storage: [{}]",
                group_key.as_str(),
                key,
                text.as_str()
            );
            self.entries[idx].handler.invoke(id, ChangeMode::NvsRestored);
            if self.entries[idx].notify() {
                let friendly = self.entries[idx].friendly;
                self.notifier.restored(
                    EntryInfo { key, friendly, group: &group_key },
                    &text,
                );
            }
        }
    }

    /// Attach [min, max] bounds to an entry, replacing any previous bounds
    pub fn set_limits(&mut self, id: EntryId, min: ParamValue, max: ParamValue) -> Result<()> {
        let entry = self.entries.get_mut(id.0).ok_or(ParamsError::NotFound)?;
        if min.param_type() != entry.value_type || max.param_type() != entry.value_type {
            return Err(ParamsError::TypeMismatch);
        }
        entry.limits = Some(ParamLimits::new(min, max));
        Ok(())
    }

    fn group_key_copy(&self, group: Option<GroupId>) -> String<MAX_NAME_LEN> {
        let mut out = String::new();
        let _ = out.push_str(self.groups.key_of(group));
        out
    }

    fn confirm_allowed(&self, kind: ParamKind) -> bool {
        self.cfg.confirm_enabled
            && kind.confirmable()
            && (kind != ParamKind::ParameterLocation || self.cfg.republish_location)
    }

    /// Publish the entry's current value to its confirmation topic
    ///
    /// `lock` sets the one-shot echo flag right before the publish so the
    /// message coming back on the subscribe side is swallowed once.
    pub fn publish_confirm(&mut self, id: EntryId, lock: bool) -> Result<()> {
        let idx = id.0;
        let kind = self.entries.get(idx).ok_or(ParamsError::NotFound)?.kind;
        if !self.confirm_allowed(kind) {
            return Ok(());
        }
        let Some(cell) = self.entries[idx].cell else {
            crate::log_warn!("Confirmation requested for entry without a value");
            return Ok(());
        };

        if self.entries[idx].confirm.is_none() {
            let topic = topics::confirm_topic(&self.cfg, &self.groups, &self.entries[idx])
                .map_err(|e| {
                    crate::log_error!("Failed to generate confirmation topic");
                    e
                })?;
            self.entries[idx].confirm = Some(topic);
        }
        let Some(topic) = self.entries[idx].confirm.clone() else {
            return Ok(());
        };

        let payload = cell.get().encode();
        // The echo lock only makes sense when the confirmation lands on the
        // topic we are subscribed to (confirm root == params root); with a
        // distinct confirm root nothing ever comes back.
        let echoes = self.entries[idx]
            .topic
            .as_ref()
            .is_some_and(|t| topics::topic_matches(t, &topic));
        if lock && echoes {
            self.entries[idx].flags.insert(EntryFlags::LOCKED);
        }
        let result = self.mqtt.publish(
            &topic,
            Some(payload.as_str()),
            self.cfg.confirm_qos,
            self.cfg.confirm_retained,
        );
        if result.is_err() {
            // No publish means no echo to swallow
            self.entries[idx].flags.remove(EntryFlags::LOCKED);
        }
        result.map_err(ParamsError::from)
    }

    /// Build topics for one entry and subscribe it
    ///
    /// A construction or subscribe failure leaves the entry unprovisioned;
    /// the next bulk open retries it.
    fn subscribe_entry(&mut self, idx: usize) {
        if self.entries[idx].subscribed() {
            return;
        }

        let topic = match topics::subscribe_topic(&self.cfg, &self.groups, &self.entries[idx]) {
            Ok(t) => t,
            Err(_) => {
                crate::log_error!(
                    "Failed to build subscribe topic for \"{}\"",
                    self.entries[idx].key
                );
                return;
            }
        };
        let qos = self.entries[idx].qos;

        if self.cfg.wildcard && self.entries[idx].kind.wildcard_covered() {
            // One shared subscription; the per-entry topic is kept for
            // inbound exact-match routing only.
            if self.wildcard.is_none() {
                let wildcard = match topics::wildcard_topic(&self.cfg) {
                    Ok(w) => w,
                    Err(_) => {
                        crate::log_error!("Failed to build wildcard topic");
                        return;
                    }
                };
                match self.mqtt.subscribe(&wildcard, self.cfg.default_qos) {
                    Ok(_) => self.wildcard = Some(wildcard),
                    Err(_) => {
                        crate::log_warn!("Failed to open wildcard subscription");
                        return;
                    }
                }
            }
            self.entries[idx].topic = Some(topic);
            self.entries[idx].flags.insert(EntryFlags::SUBSCRIBED);
        } else {
            crate::log_debug!("Try subscribe to topic: {}", topic.as_str());
            match self.mqtt.subscribe(&topic, qos) {
                Ok(_) => {
                    self.entries[idx].topic = Some(topic);
                    self.entries[idx].flags.insert(EntryFlags::SUBSCRIBED);
                }
                Err(_) => {
                    crate::log_warn!("Failed subscribe to topic [ {} ]", topic.as_str());
                }
            }
        }
    }

    /// Apply an incoming payload to a value-bearing entry
    ///
    /// The value-set state machine: parse, equality short-circuit, range
    /// check, then the mutate/persist/confirm/notify sequence. All faults
    /// are absorbed; `republish` enables the echo confirmation in the
    /// equal-value case (changed and out-of-range values always confirm so
    /// the transport converges).
    pub fn apply_incoming(&mut self, id: EntryId, payload: &str, republish: bool) {
        let Some(entry) = self.entries.get(id.0) else {
            return;
        };
        let kind = entry.kind;
        let value_type = entry.value_type;
        let key = entry.key;
        let friendly = entry.friendly;
        let notify = entry.notify();
        let Some(cell) = entry.cell else {
            crate::log_warn!("Value payload for entry \"{}\" without a value cell", key);
            return;
        };
        let group_key = self.group_key_copy(entry.group);

        let new_value = match ParamValue::decode(value_type, payload) {
            Ok(v) => v,
            Err(_) => {
                crate::log_error!("Could not convert value [ {} ] for \"{}\"", payload, key);
                if notify {
                    self.notifier.bad_value(
                        EntryInfo { key, friendly, group: &group_key },
                        payload,
                    );
                }
                return;
            }
        };

        let current = cell.get();
        if new_value == current {
            crate::log_info!("Received value for \"{}\" does not differ, ignored", key);
            if notify {
                self.notifier.equal(EntryInfo { key, friendly, group: &group_key });
            }
            if republish {
                let _ = self.publish_confirm(id, true);
            }
            return;
        }

        if let Some(limits) = &self.entries[id.0].limits {
            if !limits.contains(&new_value) {
                crate::log_warn!("Value [ {} ] for \"{}\" is out of range", payload, key);
                if notify {
                    self.notifier.out_of_range(
                        EntryInfo { key, friendly, group: &group_key },
                        payload,
                    );
                }
                // Push the current valid value back so the transport converges
                let _ = self.publish_confirm(id, true);
                return;
            }
        }

        let old_text = current.encode();
        let new_text = new_value.encode();

        // The cell's own critical section covers the single assignment;
        // readers outside the registry lock never see a torn value.
        cell.set(new_value.clone());
        self.entries[id.0].handler.invoke(id, ChangeMode::SetChanged);

        if kind.persisted() {
            if let Err(_e) = self.store.write(&group_key, key, &new_value) {
                crate::log_error!("Failed to persist \"{}.{}\"", group_key.as_str(), key);
            }
        }

        let _ = self.publish_confirm(id, true);

        crate::log_info!(
            "Parameter \"{}.{}\" changed: [{}] -> [{}]",
            group_key.as_str(),
            key,
            old_text.as_str(),
            new_text.as_str()
        );
        if notify {
            self.notifier.changed(
                EntryInfo { key, friendly, group: &group_key },
                &old_text,
                &new_text,
            );
        }
    }

    /// Persist and re-publish a value that was mutated in place
    ///
    /// For code that writes the cell directly: persists the current cell
    /// content, fires the handler with [`ChangeMode::SetInternal`] when
    /// asked, and publishes a locked confirmation.
    pub fn store_internal_value(&mut self, id: EntryId, call_handler: bool) {
        let Some(entry) = self.entries.get(id.0) else {
            return;
        };
        let kind = entry.kind;
        let key = entry.key;
        let Some(cell) = entry.cell else {
            return;
        };
        let group_key = self.group_key_copy(entry.group);

        if kind.persisted() {
            let value = cell.get();
            if let Err(_e) = self.store.write(&group_key, key, &value) {
                crate::log_error!("Failed to persist \"{}.{}\"", group_key.as_str(), key);
            }
        }
        if call_handler {
            self.entries[id.0].handler.invoke(id, ChangeMode::SetInternal);
        }
        let _ = self.publish_confirm(id, true);
    }

    /// Route an incoming transport message to the matching entry
    ///
    /// Exact case-insensitive topic match over the (small, bounded) entry
    /// list. A locked entry swallows exactly one message and clears the
    /// lock. No match is logged but never an error.
    pub fn on_incoming_message(&mut self, topic: &str, payload: &str) {
        let Some(idx) = self.entries.iter().position(|e| {
            e.topic
                .as_ref()
                .is_some_and(|t| topics::topic_matches(t, topic))
        }) else {
            crate::log_warn!("Message from topic [ {} ] was not processed", topic);
            self.notifier.unhandled_topic(topic);
            return;
        };
        let id = EntryId(idx);

        if self.entries[idx].locked() {
            self.entries[idx].flags.remove(EntryFlags::LOCKED);
            crate::log_debug!("Own publication on [ {} ] swallowed", topic);
            return;
        }

        match self.entries[idx].kind {
            ParamKind::Ota => {
                if payload.is_empty() {
                    // Retained-topic replay after clearing
                    crate::log_debug!("Empty OTA payload ignored");
                    return;
                }
                crate::log_info!("OTA firmware upgrade requested from \"{}\"", payload);
                self.notifier.ota_started(payload);
                self.clear_retained(idx);
                self.control.start_ota(payload);
            }
            ParamKind::Command => {
                if payload.is_empty() {
                    crate::log_debug!("Empty command payload ignored");
                    return;
                }
                crate::log_info!("Command received: [ {} ]", payload);
                self.notifier.command_received(payload);
                self.clear_retained(idx);
                if payload.eq_ignore_ascii_case(self.cfg.restart_command) {
                    crate::log_info!("Restart requested via command topic");
                    self.control.restart();
                } else {
                    self.control.execute_command(payload);
                }
            }
            ParamKind::Signal => {
                self.entries[idx].handler.invoke(id, ChangeMode::SetChanged);
            }
            ParamKind::SignalAutoClear => {
                self.entries[idx].handler.invoke(id, ChangeMode::SetChanged);
                self.clear_retained(idx);
            }
            _ => self.apply_incoming(id, payload, false),
        }
    }

    /// Drop a retained payload from the broker without hearing it back:
    /// unsubscribe, publish empty retained, resubscribe
    fn clear_retained(&mut self, idx: usize) {
        let Some(topic) = self.entries[idx].topic.clone() else {
            return;
        };
        let qos = self.entries[idx].qos;
        let _ = self.mqtt.unsubscribe(&topic);
        let _ = self.mqtt.publish(&topic, None, qos, true);
        let _ = self.mqtt.subscribe(&topic, qos);
    }

    /// Bounded wait for the transport outbox to drain
    async fn drain_backlog(&self) {
        let mut polls = 0u32;
        while self.mqtt.outbox_depth() > self.cfg.backlog_threshold {
            polls += 1;
            if polls > self.cfg.backlog_poll_limit {
                crate::log_warn!("Transport backlog did not drain, proceeding anyway");
                return;
            }
            embassy_futures::yield_now().await;
        }
    }

    /// Bulk (re)provision all entries after a transport connect
    ///
    /// `primary` is the broker role reported by the transport; a role change
    /// (or `force`) tears existing state down first. If the connection drops
    /// mid-iteration, all subscriptions are torn down and a transport
    /// restart is requested - a partial state is never left standing.
    pub async fn open_subscriptions(&mut self, primary: bool, force: bool) -> Result<()> {
        if !self.mqtt.is_connected() {
            crate::log_debug!("Transport not connected, subscriptions postponed");
            return Ok(());
        }

        let role_changed = self.primary.is_some_and(|p| p != primary);
        self.primary = Some(primary);
        if force || role_changed {
            self.close_subscriptions();
        }

        // Publication of current settings (entries without a confirm topic yet)
        for idx in 0..self.entries.len() {
            let entry = &self.entries[idx];
            if entry.confirm.is_none()
                && entry.cell.is_some()
                && self.confirm_allowed(entry.kind)
            {
                let _ = self.publish_confirm(EntryId(idx), false);
                embassy_futures::yield_now().await;
            }
        }

        crate::log_info!("Subscribing to parameter topics...");
        for idx in 0..self.entries.len() {
            if !self.mqtt.is_connected() {
                crate::log_warn!("Connection lost during subscribe, resetting");
                self.close_subscriptions();
                self.mqtt.request_restart();
                return Err(TransportError::Disconnected.into());
            }
            if self.entries[idx].subscribed() {
                continue;
            }
            self.drain_backlog().await;
            self.subscribe_entry(idx);
            embassy_futures::yield_now().await;
        }

        Ok(())
    }

    /// Tear down all transport state
    ///
    /// Unsubscribes every subscribed entry (wildcard entries share the one
    /// wildcard unsubscribe), then frees every topic string unconditionally
    /// and clears the subscribed and lock flags. Safe to call in any state.
    pub fn close_subscriptions(&mut self) {
        crate::log_info!("Resetting parameter topics...");

        if let Some(wildcard) = self.wildcard.take() {
            let _ = self.mqtt.unsubscribe(&wildcard);
        }

        for idx in 0..self.entries.len() {
            let covered = self.cfg.wildcard && self.entries[idx].kind.wildcard_covered();
            if self.entries[idx].subscribed() && !covered {
                if let Some(topic) = self.entries[idx].topic.clone() {
                    let _ = self.mqtt.unsubscribe(&topic);
                }
            }
            let entry = &mut self.entries[idx];
            entry.topic = None;
            entry.confirm = None;
            entry.flags.remove(EntryFlags::SUBSCRIBED | EntryFlags::LOCKED);
        }
    }
}
