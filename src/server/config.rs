//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::registry::RegistryConfig;

/// JPEG quality used by each kind of reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityProfile {
    /// General reads (base64 frames)
    pub read: u8,

    /// Live multipart sequences, kept low to save bandwidth
    pub live: u8,

    /// Snapshots, favoring fidelity
    pub snapshot: u8,
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self {
            read: 85,
            live: 75,
            snapshot: 90,
        }
    }
}

impl QualityProfile {
    /// Set the general read quality (clamped to 1..=100)
    pub fn read(mut self, quality: u8) -> Self {
        self.read = quality.clamp(1, 100);
        self
    }

    /// Set the live sequence quality (clamped to 1..=100)
    pub fn live(mut self, quality: u8) -> Self {
        self.live = quality.clamp(1, 100);
        self
    }

    /// Set the snapshot quality (clamped to 1..=100)
    pub fn snapshot(mut self, quality: u8) -> Self {
        self.snapshot = quality.clamp(1, 100);
        self
    }
}

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Serve camera streams at all; when false stream routes answer 503
    pub streaming_enabled: bool,

    /// JPEG quality per reader kind
    pub quality: QualityProfile,

    /// Registry and worker settings
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            streaming_enabled: true,
            quality: QualityProfile::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Turn off streaming
    pub fn disable_streaming(mut self) -> Self {
        self.streaming_enabled = false;
        self
    }

    /// Set the quality profile
    pub fn quality(mut self, quality: QualityProfile) -> Self {
        self.quality = quality;
        self
    }

    /// Set the registry configuration
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Set the reaper interval
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.registry = self.registry.reap_interval(interval);
        self
    }
}
