mod discover;

pub use discover::DsyncDiscoveryUseCase;
