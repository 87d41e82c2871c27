use std::net::{Ipv4Addr, SocketAddr};

use crate::{ListenEndpoint, Secret};

pub(crate) const fn _default_true() -> bool {
    true
}

pub(crate) const fn _default_purge_batch_size() -> u64 {
    1000
}

#[inline]
pub(crate) fn _default_site_id() -> String {
    "local".to_owned()
}

#[inline]
pub(crate) fn _default_database_url() -> Secret<String> {
    Secret::new("sqlite:data/db".to_owned())
}

#[inline]
pub(crate) fn _default_http_listen() -> ListenEndpoint {
    ListenEndpoint(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8888)))
}
