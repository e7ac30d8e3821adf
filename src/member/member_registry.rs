use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use rand::seq::SliceRandom;
use tracing::{debug, error, trace, warn};

use crate::basic::error::ConfError;
use crate::basic::json::{ConfJson, JSON_CONTENT_TYPE};
use crate::basic::result::ConfResult;
use crate::basic::uri::ConfUri;
use crate::member::{MemberOptions, Members, STATUS_UP};
use crate::web::web_client::{ConfHttpRequest, ConfTransport, Method};

const EMPTY_CONFIG_SERVER_CONFIG: &str = "empty config server passed";
const EMPTY_CONFIG_SERVER_MEMBERS: &str = "empty config server member";
const PACKAGE_INIT_ERROR: &str = "member registry not initialized successfully";

struct MembershipState {
    initialized: bool,
    /// Replaced as a whole by writers, readers keep the snapshot they cloned.
    addresses: Arc<Vec<String>>,
}

/// Candidate config-center hosts of one client.
///
/// The lock only guards the address list and the initialized flag, it is never
/// held while a discovery request is in flight.
pub struct MemberRegistry {
    options: MemberOptions,
    transport: Arc<dyn ConfTransport>,
    state: RwLock<MembershipState>,
}

impl MemberRegistry {
    pub fn new(options: MemberOptions, transport: Arc<dyn ConfTransport>) -> Self {
        MemberRegistry {
            options,
            transport,
            state: RwLock::new(MembershipState {
                initialized: false,
                addresses: Arc::new(Vec::new()),
            }),
        }
    }

    pub fn options(&self) -> &MemberOptions {
        &self.options
    }

    pub fn transport(&self) -> &Arc<dyn ConfTransport> {
        &self.transport
    }

    pub fn is_initialized(&self) -> ConfResult<bool> {
        Ok(self.state.read()?.initialized)
    }

    /// Current address list, without normalizing or reordering it.
    pub fn snapshot(&self) -> ConfResult<Arc<Vec<String>>> {
        Ok(self.state.read()?.addresses.clone())
    }

    /// Seed the address list and shuffle it once.
    ///
    /// Calls after a successful initialization are no-ops.
    pub fn initialize(&self, seeds: &[String]) -> ConfResult<()> {
        let mut state = self.state.write()?;
        if state.initialized {
            return Ok(());
        }
        if state.addresses.is_empty() {
            if seeds.is_empty() {
                error!("[ConfSource.Member] {}", EMPTY_CONFIG_SERVER_CONFIG);
                return Err(ConfError::EmptySeed(EMPTY_CONFIG_SERVER_CONFIG.to_string()));
            }
            let mut addresses = seeds.to_vec();
            addresses.shuffle(&mut rand::thread_rng());
            debug!("[ConfSource.Member] Seeded members {:?}", addresses);
            state.addresses = Arc::new(addresses);
        }
        state.initialized = true;
        Ok(())
    }

    /// Addresses to dispatch to, in a freshly randomized order.
    ///
    /// With auto discovery the list is first rebuilt from the members api, otherwise
    /// addresses lacking a scheme get the one matching the ssl policy.
    pub async fn get_servers(&self) -> ConfResult<Vec<String>> {
        {
            let state = self.state.read()?;
            if !state.initialized {
                error!("[ConfSource.Member] {}", PACKAGE_INIT_ERROR);
                return Err(ConfError::NotInitialized(PACKAGE_INIT_ERROR.to_string()));
            }
            if state.addresses.is_empty() {
                error!("[ConfSource.Member] {}", EMPTY_CONFIG_SERVER_MEMBERS);
                return Err(ConfError::NoMembers(EMPTY_CONFIG_SERVER_MEMBERS.to_string()));
            }
        }
        if self.options.auto_discovery {
            if let Err(error) = self.refresh_members().await {
                error!("[ConfSource.Member] Refresh member is failed: {}", error);
                return Err(error);
            }
        } else {
            self.normalize_schemes()?;
        }
        if let Err(error) = self.shuffle() {
            error!("[ConfSource.Member] Member shuffle is failed: {}", error);
            return Err(error);
        }
        let addresses = self.snapshot()?;
        debug!("[ConfSource.Member] Member server return {:?}", addresses.first());
        Ok(addresses.as_ref().clone())
    }

    fn normalize_schemes(&self) -> ConfResult<()> {
        let mut state = self.state.write()?;
        let addresses = state.addresses.iter().map(|address| ConfUri.ensure_scheme(address, self.options.enable_ssl)).collect::<Vec<String>>();
        state.addresses = Arc::new(addresses);
        Ok(())
    }

    /// Rebuild the address list from the entry points the known hosts report as up.
    ///
    /// Unreachable hosts are skipped; only when every host fails is the last failure
    /// returned and the list left untouched.
    pub async fn refresh_members(&self) -> ConfResult<()> {
        let hosts = self.snapshot()?;
        if hosts.is_empty() {
            return Ok(());
        }
        let mut failures = 0;
        let mut seen = HashSet::new();
        let mut entry_points = Vec::new();
        for host in hosts.iter() {
            debug!("[ConfSource.Member] Refresh members from host {}", host);
            match self.probe(host).await {
                Ok(members) => {
                    for instance in members.instances.into_iter().filter(|instance| instance.status == STATUS_UP) {
                        for entry_point in instance.entry_points {
                            match ConfUri.replace_scheme(&entry_point, self.options.enable_ssl) {
                                Some(address) => {
                                    if seen.insert(address.clone()) {
                                        entry_points.push(address);
                                    }
                                }
                                None => trace!("[ConfSource.Member] Ignore malformed entry point {}", entry_point),
                            }
                        }
                    }
                }
                Err(error) if error.is_host_failure() => {
                    failures += 1;
                    error!("[ConfSource.Member] Member request failed with error: {}", error);
                    if failures >= hosts.len() {
                        return Err(error);
                    }
                }
                Err(error) => {
                    error!("[ConfSource.Member] Config source member request failed with error: {}", error);
                }
            }
        }
        let mut state = self.state.write()?;
        debug!("[ConfSource.Member] Refreshed members {:?}", entry_points);
        state.addresses = Arc::new(entry_points);
        Ok(())
    }

    /// Uniformly permute the address list.
    pub fn shuffle(&self) -> ConfResult<()> {
        let mut state = self.state.write()?;
        if state.addresses.is_empty() {
            error!("[ConfSource.Member] {}", EMPTY_CONFIG_SERVER_CONFIG);
            return Err(ConfError::EmptySeed(EMPTY_CONFIG_SERVER_CONFIG.to_string()));
        }
        trace!("[ConfSource.Member] Before shuffled member {:?}", state.addresses);
        let mut addresses = state.addresses.as_ref().clone();
        addresses.shuffle(&mut rand::thread_rng());
        trace!("[ConfSource.Member] Shuffled member {:?}", addresses);
        state.addresses = Arc::new(addresses);
        Ok(())
    }

    /// Keep the candidates answering the members api with a well formed payload,
    /// whatever status they declare.
    pub async fn get_working_addresses(&self, candidates: &[String]) -> ConfResult<Vec<String>> {
        let mut working = Vec::new();
        for candidate in candidates {
            match self.probe(candidate).await {
                Ok(_) => working.push(candidate.clone()),
                Err(error) => warn!("[ConfSource.Member] Config source member request to {} failed with error: {}", candidate, error),
            }
        }
        Ok(working)
    }

    async fn probe(&self, host: &str) -> ConfResult<Members> {
        let host = ConfUri.ensure_scheme(host, self.options.enable_ssl);
        let url = ConfUri.join(&host, &self.options.api_paths.members);
        let response = self.transport.execute(ConfHttpRequest::new(Method::GET, url.clone()).headers(self.options.default_headers())).await?;
        if !response.is_success() {
            return Err(ConfError::BadStatus(response.code, format!("[ConfSource.Member] Call {} failed, resp body: {}", url, response.body)));
        }
        ConfJson.body_to_obj::<Members>(response.content_type(), JSON_CONTENT_TYPE, &response.body)
    }
}
