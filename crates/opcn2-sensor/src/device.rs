//! OPC-N2 device
//!
//! Opening the device runs the whole initialization sequence, so an `Opcn2`
//! value is always ready for use. If any step fails the adapter is dropped
//! and the port released before the error is returned.

use opcn2_usbiss::{LinkConfig, SerialTransport, Transport, UsbIss};

use crate::channel::CommandChannel;
use crate::decode::{self, ConfigData, Histogram, PmValues};
use crate::error::Result;
use crate::firmware::{self, Firmware};
use crate::protocol::*;

/// Alphasense OPC-N2 connected through a USB-ISS adapter
pub struct Opcn2<T: Transport> {
    iss: UsbIss<T>,
    timing: Timing,
    firmware: Firmware,
    firmware_version: String,
    config: ConfigData,
}

impl Opcn2<SerialTransport> {
    /// Open the sensor on a serial device with the standard link settings
    pub fn open_serial(device: &str) -> Result<Self> {
        let iss = UsbIss::open_serial(device, LinkConfig::default())?;
        Self::open(iss, Timing::default())
    }
}

impl<T: Transport> Opcn2<T> {
    /// Initialize the sensor over a configured adapter
    ///
    /// This performs initialization:
    /// 1. Query the firmware version
    /// 2. Select the decoder for that revision
    /// 3. Query and decode the configuration block
    pub fn open(mut iss: UsbIss<T>, timing: Timing) -> Result<Self> {
        let mut channel = CommandChannel::new(&mut iss, timing);

        let firmware_version = firmware::version_string(&channel.firmware_version()?);
        log::debug!("opcn2: Firmware string {:?}", firmware_version);

        let firmware = Firmware::detect(&firmware_version)?;
        log::info!("opcn2: Found {}", firmware);

        let config = decode::decode_config(&channel.config_raw()?);
        log::debug!(
            "opcn2: Laser DAC {}, fan DAC {}, sample flow rate {}",
            config.laser_dac,
            config.fan_dac,
            config.sample_flow_rate
        );

        Ok(Self {
            iss,
            timing,
            firmware,
            firmware_version,
            config,
        })
    }

    fn channel(&mut self) -> CommandChannel<'_, T> {
        CommandChannel::new(&mut self.iss, self.timing)
    }

    /// Firmware revision in use
    pub fn firmware(&self) -> Firmware {
        self.firmware
    }

    /// Firmware version string as reported by the sensor
    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    /// Configuration block read at open time
    pub fn config(&self) -> &ConfigData {
        &self.config
    }

    /// The adapter this sensor is attached to
    pub fn link(&self) -> &UsbIss<T> {
        &self.iss
    }

    /// Switch fan and/or laser on
    pub fn power_on(&mut self, peripherals: Peripherals) -> Result<()> {
        log::debug!("opcn2: Power on {:?}", peripherals);
        self.channel().power_on(peripherals)
    }

    /// Switch fan and/or laser off
    pub fn power_off(&mut self, peripherals: Peripherals) -> Result<()> {
        log::debug!("opcn2: Power off {:?}", peripherals);
        self.channel().power_off(peripherals)
    }

    /// Set the laser power level
    pub fn set_laser_power(&mut self, level: u8) -> Result<()> {
        self.channel().set_laser_power(level)
    }

    /// Set the fan power level
    pub fn set_fan_power(&mut self, level: u8) -> Result<()> {
        self.channel().set_fan_power(level)
    }

    /// Whether the sensor answers the readiness poll
    pub fn ready(&mut self) -> Result<bool> {
        self.channel().ready()
    }

    /// Read the histogram block without decoding it
    pub fn histogram_raw(&mut self) -> Result<[u8; HISTOGRAM_LEN]> {
        self.channel().histogram_raw()
    }

    /// Read and decode a histogram
    pub fn histogram(&mut self) -> Result<Histogram> {
        let raw = self.histogram_raw()?;
        self.firmware.decode_histogram(&raw)
    }

    /// Read the PM block
    pub fn pm(&mut self) -> Result<PmValues> {
        let raw = self.channel().pm_raw()?;
        Ok(decode::decode_pm(&raw))
    }

    /// Read the configuration block without decoding it
    pub fn config_raw(&mut self) -> Result<[u8; CONFIG_LEN]> {
        self.channel().config_raw()
    }

    /// Query the configuration block again
    ///
    /// The cached copy returned by [`Opcn2::config`] is left untouched.
    pub fn read_config(&mut self) -> Result<ConfigData> {
        let raw = self.config_raw()?;
        Ok(decode::decode_config(&raw))
    }

    /// Release the adapter
    pub fn close(self) -> Result<()> {
        log::debug!("opcn2: Closing");
        self.iss.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Weather;
    use crate::error::Opcn2Error;
    use opcn2_dummy::{ConfigBuilder, DummyConfig, DummyOpc, HistogramBuilder};
    use opcn2_usbiss::IssError;

    fn open(config: DummyConfig) -> Result<Opcn2<DummyOpc>> {
        let iss = UsbIss::open(DummyOpc::new(config), LinkConfig::default())?;
        Opcn2::open(iss, Timing::none())
    }

    #[test]
    fn test_open() {
        let mut config = DummyConfig::default();
        config.config = ConfigBuilder::new().laser_dac(0xB4).fan_dac(0xC8).build();
        let opc = open(config).unwrap();

        assert_eq!(opc.firmware(), Firmware::V18);
        assert!(opc.firmware_version().starts_with("OPC-N2 FirmwareVer=OPC-018"));
        assert_eq!(opc.config().laser_dac, 0xB4);
        assert_eq!(opc.config().fan_dac, 0xC8);

        // Firmware query, then config query
        let log = opc.link().transport().spi_log();
        assert_eq!(log.len(), 1 + FIRMWARE_LEN + 1 + CONFIG_LEN);
        assert_eq!(log[0], CMD_FIRMWARE);
        assert_eq!(log[1 + FIRMWARE_LEN], CMD_CONFIG);
    }

    #[test]
    fn test_open_unknown_firmware() {
        let mut config = DummyConfig::default();
        config.firmware = "OPC-N2 FirmwareVer=OPC-012.0....BD".into();
        assert!(matches!(open(config), Err(Opcn2Error::UnknownFirmware(_))));
    }

    #[test]
    fn test_open_unknown_firmware_skips_config() {
        let mut config = DummyConfig::default();
        config.firmware = "not an OPC".into();
        let mut dummy = DummyOpc::new(config);
        {
            let iss = UsbIss::open(&mut dummy, LinkConfig::default()).unwrap();
            assert!(Opcn2::open(iss, Timing::none()).is_err());
        }
        assert_eq!(dummy.spi_log().len(), 1 + FIRMWARE_LEN);
    }

    #[test]
    fn test_open_adapter_refused() {
        let mut config = DummyConfig::default();
        config.setup_error = Some(0x05);
        let result = UsbIss::open(DummyOpc::new(config), LinkConfig::default());
        assert!(matches!(result, Err(IssError::Adapter(_))));
    }

    #[test]
    fn test_histogram() {
        let mut config = DummyConfig::default();
        config.histogram = HistogramBuilder::new()
            .bins([1; 16])
            .weather(1_013_250)
            .pm([2.0, 4.0, 8.0])
            .build();
        let mut opc = open(config).unwrap();

        let h = opc.histogram().unwrap();
        assert_eq!(h.bins, [1; 16]);
        assert_eq!(h.checksum, 16);
        assert!(!h.checksum_error);
        assert_eq!(h.weather, Weather::Pressure(1_013_250));
        assert_eq!(h.pm.pm10, 8.0);
    }

    #[test]
    fn test_histogram_checksum_error_is_a_flag() {
        let mut config = DummyConfig::default();
        config.histogram = HistogramBuilder::new()
            .bins([1; 16])
            .checksum(15)
            .pm([1.0, 2.0, 3.0])
            .build();
        let mut opc = open(config).unwrap();
        assert!(opc.histogram().unwrap().checksum_error);
    }

    #[test]
    fn test_histogram_pm_out_of_order() {
        let mut config = DummyConfig::default();
        config.histogram = HistogramBuilder::new().pm([3.0, 2.0, 1.0]).build();
        let mut opc = open(config).unwrap();
        assert!(matches!(
            opc.histogram(),
            Err(Opcn2Error::PmOutOfOrder { .. })
        ));
        // Raw access still works
        assert!(opc.histogram_raw().is_ok());
    }

    #[test]
    fn test_pm() {
        let mut config = DummyConfig::default();
        config.pm = [10.0, 20.0, 30.0];
        let mut opc = open(config).unwrap();
        let pm = opc.pm().unwrap();
        assert_eq!(pm.pm1, 10.0);
        assert_eq!(pm.pm2_5, 20.0);
        assert_eq!(pm.pm10, 30.0);
    }

    #[test]
    fn test_power_and_levels() {
        let mut opc = open(DummyConfig::default()).unwrap();
        opc.power_on(Peripherals::ALL).unwrap();
        assert!(opc.ready().unwrap());
        opc.set_laser_power(0x90).unwrap();
        opc.set_fan_power(0x20).unwrap();
        opc.power_off(Peripherals::LASER).unwrap();

        let state = opc.link().transport().state();
        assert!(state.fan);
        assert!(!state.laser);
        assert_eq!(state.laser_power, 0x90);
        assert_eq!(state.fan_power, 0x20);
    }

    #[test]
    fn test_read_config_requeries() {
        let mut opc = open(DummyConfig::default()).unwrap();
        let before = opc.link().transport().spi_log().len();
        let config = opc.read_config().unwrap();
        assert_eq!(&config, opc.config());
        assert_eq!(
            opc.link().transport().spi_log().len(),
            before + 1 + CONFIG_LEN
        );
    }

    #[test]
    fn test_transfer_failure_during_open() {
        let mut config = DummyConfig::default();
        config.transfer_status_at = Some((10, 0x00));
        assert!(matches!(
            open(config),
            Err(Opcn2Error::Iss(IssError::Transmission))
        ));
    }

    #[test]
    fn test_reopen_sees_new_sensor_data() {
        let mut dummy = DummyOpc::new_default();
        {
            let iss = UsbIss::open(&mut dummy, LinkConfig::default()).unwrap();
            let mut opc = Opcn2::open(iss, Timing::none()).unwrap();
            opc.power_on(Peripherals::FAN).unwrap();
            assert_ne!(opc.histogram().unwrap().bins, [7; 16]);
            opc.close().unwrap();
        }

        dummy.config_mut().histogram = HistogramBuilder::new()
            .bins([7; 16])
            .pm([1.0, 1.0, 1.0])
            .build();
        dummy.config_mut().config = ConfigBuilder::new().fan_dac(0x10).build();

        let iss = UsbIss::open(&mut dummy, LinkConfig::default()).unwrap();
        let mut opc = Opcn2::open(iss, Timing::none()).unwrap();
        assert_eq!(opc.config().fan_dac, 0x10);
        let h = opc.histogram().unwrap();
        assert_eq!(h.bins, [7; 16]);
        assert_eq!(h.checksum, 112);
        assert!(opc.link().transport().state().fan);
    }

    #[test]
    fn test_close() {
        let opc = open(DummyConfig::default()).unwrap();
        opc.close().unwrap();
    }
}
