use log::debug;
use log::warn;
use serialport::SerialPortInfo;
use serialport::SerialPortType;

pub const DEFAULT_MARKER: &str = "USB Serial Device";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortListing {
    pub port_name: String,
    pub description: String,
}

pub trait PortEnumerator {
    fn ports(&self) -> Result<Vec<PortListing>, serialport::Error>;
}

/// Lists the serial ports the operating system currently knows about.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn ports(&self) -> Result<Vec<PortListing>, serialport::Error> {
        let ports = serialport::available_ports()?;
        Ok(ports.iter().map(to_listing).collect())
    }
}

fn to_listing(port: &SerialPortInfo) -> PortListing {
    let description = match &port.port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .clone()
            .or_else(|| usb.manufacturer.clone())
            .unwrap_or_else(|| port.port_name.clone()),
        SerialPortType::PciPort => format!("PCI Device ({})", port.port_name),
        SerialPortType::BluetoothPort => format!("Bluetooth Device ({})", port.port_name),
        _ => format!("Unknown ({})", port.port_name),
    };
    PortListing {
        port_name: port.port_name.clone(),
        description,
    }
}

pub fn list_ports<P: PortEnumerator + ?Sized>(enumerator: &P) -> Vec<PortListing> {
    match enumerator.ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("Failed to enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}

/// Returns the name of the first port whose description contains `marker`.
///
/// The match is a case sensitive substring match because adapters often append
/// extra descriptors to their vendor string. The result must not be cached,
/// port names may change whenever the adapter is re-plugged.
pub fn resolve_port<P: PortEnumerator + ?Sized>(enumerator: &P, marker: &str) -> Option<String> {
    let port = list_ports(enumerator)
        .into_iter()
        .find(|port| port.description.contains(marker));
    match &port {
        Some(port) => debug!("Resolved '{}' to port {}", marker, port.port_name),
        None => debug!("No serial port matches '{}'", marker),
    }
    port.map(|port| port.port_name)
}
