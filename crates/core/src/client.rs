// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Builds the two `reqwest::Client` pools the distributor needs: one for
/// forwarding packets to analyzers on the data path, tuned to `Tsend`, and
/// one for the background health prober, tuned to `Thealth`. Kept separate
/// so a slow or hung analyzer on the data path cannot starve the prober's
/// connection pool, or vice versa. The keep-alive pool is sized around the
/// suggested defaults of roughly 100 total connections, 20 idle per host.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .tcp_nodelay(true)
        .pool_max_idle_per_host(20)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}
