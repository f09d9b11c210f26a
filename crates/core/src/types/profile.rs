//! Canned system profiles per hosting provider

use super::Provider;

/// Synthetic OS and hardware description used by the banner and by
/// `uname`, `cat /etc/os-release`, `htop`, `free` and `df`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemProfile {
    pub os_name: &'static str,
    pub os_version: &'static str,
    /// `VERSION_CODENAME` in os-release
    pub codename: &'static str,
    pub kernel: &'static str,
    pub architecture: &'static str,
    pub cpu_model: &'static str,
    pub cpu_cores: u32,
    pub memory_gb: u32,
    pub disk_gb: u32,
    pub hostname: &'static str,
}

const GCP: SystemProfile = SystemProfile {
    os_name: "Ubuntu",
    os_version: "22.04.3 LTS",
    codename: "jammy",
    kernel: "5.15.0-1047-gcp",
    architecture: "x86_64",
    cpu_model: "Intel(R) Xeon(R) CPU @ 2.20GHz",
    cpu_cores: 2,
    memory_gb: 4,
    disk_gb: 50,
    hostname: "gcp-instance-1",
};

const AWS: SystemProfile = SystemProfile {
    os_name: "Ubuntu",
    os_version: "22.04.3 LTS",
    codename: "jammy",
    kernel: "6.2.0-1017-aws",
    architecture: "x86_64",
    cpu_model: "Intel(R) Xeon(R) Platinum 8259CL CPU @ 2.50GHz",
    cpu_cores: 2,
    memory_gb: 8,
    disk_gb: 30,
    hostname: "ip-172-31-32-10",
};

const AZURE: SystemProfile = SystemProfile {
    os_name: "Ubuntu",
    os_version: "20.04.6 LTS",
    codename: "focal",
    kernel: "5.15.0-1052-azure",
    architecture: "x86_64",
    cpu_model: "Intel(R) Xeon(R) Platinum 8272CL CPU @ 2.60GHz",
    cpu_cores: 2,
    memory_gb: 8,
    disk_gb: 64,
    hostname: "azure-vm-01",
};

const DIGITALOCEAN: SystemProfile = SystemProfile {
    os_name: "Debian GNU/Linux",
    os_version: "12 (bookworm)",
    codename: "bookworm",
    kernel: "6.1.0-13-amd64",
    architecture: "x86_64",
    cpu_model: "DO-Regular",
    cpu_cores: 1,
    memory_gb: 2,
    disk_gb: 50,
    hostname: "droplet-01",
};

const VULTR: SystemProfile = SystemProfile {
    os_name: "Ubuntu",
    os_version: "22.04.3 LTS",
    codename: "jammy",
    kernel: "5.15.0-88-generic",
    architecture: "x86_64",
    cpu_model: "AMD EPYC-Rome Processor",
    cpu_cores: 1,
    memory_gb: 1,
    disk_gb: 25,
    hostname: "vultr-guest",
};

const LINODE: SystemProfile = SystemProfile {
    os_name: "Debian GNU/Linux",
    os_version: "11 (bullseye)",
    codename: "bullseye",
    kernel: "5.10.0-26-cloud-amd64",
    architecture: "x86_64",
    cpu_model: "AMD EPYC 7642 48-Core Processor",
    cpu_cores: 1,
    memory_gb: 2,
    disk_gb: 50,
    hostname: "localhost-linode",
};

const GENERIC: SystemProfile = SystemProfile {
    os_name: "Ubuntu",
    os_version: "22.04.3 LTS",
    codename: "jammy",
    kernel: "5.15.0-91-generic",
    architecture: "x86_64",
    cpu_model: "QEMU Virtual CPU version 2.5+",
    cpu_cores: 2,
    memory_gb: 4,
    disk_gb: 40,
    hostname: "vps-server",
};

impl SystemProfile {
    /// Profile for a provider; `Other` gets the generic entry
    pub fn for_provider(provider: Provider) -> &'static SystemProfile {
        match provider {
            Provider::Gcp => &GCP,
            Provider::Aws => &AWS,
            Provider::Azure => &AZURE,
            Provider::DigitalOcean => &DIGITALOCEAN,
            Provider::Vultr => &VULTR,
            Provider::Linode => &LINODE,
            Provider::Other => &GENERIC,
        }
    }

    /// `PRETTY_NAME`, e.g. `Ubuntu 22.04.3 LTS`
    pub fn pretty_name(&self) -> String {
        format!("{} {}", self.os_name, self.os_version)
    }

    /// Numeric part of the OS version (`22.04.3`, `12`)
    pub fn version_id(&self) -> &'static str {
        self.os_version
            .split_whitespace()
            .next()
            .unwrap_or(self.os_version)
    }

    /// os-release `ID`
    pub fn os_id(&self) -> &'static str {
        if self.os_name.starts_with("Debian") {
            "debian"
        } else {
            "ubuntu"
        }
    }

    /// Full `uname -a` line
    pub fn uname(&self) -> String {
        format!(
            "Linux {} {} #1 SMP {} GNU/Linux",
            self.hostname, self.kernel, self.architecture
        )
    }

    pub fn memory_mb(&self) -> u64 {
        u64::from(self.memory_gb) * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_provider_has_profile() {
        for provider in Provider::ALL {
            let profile = SystemProfile::for_provider(provider);
            assert!(!profile.hostname.is_empty());
            assert!(profile.cpu_cores > 0);
        }
    }

    #[test]
    fn test_unknown_provider_uses_generic() {
        let profile = SystemProfile::for_provider(Provider::from_tag("hetzner"));
        assert_eq!(profile.hostname, "vps-server");
    }

    #[test]
    fn test_derived_strings() {
        let gcp = SystemProfile::for_provider(Provider::Gcp);
        assert_eq!(gcp.pretty_name(), "Ubuntu 22.04.3 LTS");
        assert_eq!(gcp.version_id(), "22.04.3");
        assert_eq!(gcp.os_id(), "ubuntu");
        assert!(gcp.uname().contains("gcp-instance-1"));
        assert!(gcp.uname().contains("5.15.0-1047-gcp"));

        let debian = SystemProfile::for_provider(Provider::DigitalOcean);
        assert_eq!(debian.version_id(), "12");
        assert_eq!(debian.os_id(), "debian");
    }
}
