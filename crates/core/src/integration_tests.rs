//! Integration tests: exercise the full flow using a simulated TM155.
//!
//! The simulated device answers the sync commands a connecting host issues
//! and streams config and button blobs back as input reports, so these tests
//! drive the read→modify→write pipeline across modules the way the CLI does.

#[cfg(test)]
mod tests {
    use crate::action::{ButtonAction, CycleAdjust};
    use crate::bulk::testing::RecordingPacer;
    use crate::bulk::{self, BulkReader, DumpRegion, PendingRead, BLOCK_LEN};
    use crate::buttons::{self, ButtonMap, ButtonSlot, PhysicalButton};
    use crate::command::{ids, NO_ARGS};
    use crate::config::{self, ConfigBlob, Rgb};
    use crate::keys::MouseButton;
    use crate::report_rate::ReportRate;
    use crate::safety::BLOB_LEN;
    use crate::transport::mock::MockTransport;
    use crate::{dpi, lighting, profile, report_rate, system};

    const PROFILE: u8 = 2;

    /// Blob contents the simulated device holds for a region.
    fn stored_blob(region: DumpRegion) -> Vec<u8> {
        let seed = match region {
            DumpRegion::Config => 0x11u8,
            DumpRegion::Buttons => 0x22,
            DumpRegion::Extra => 0x33,
        };
        let mut blob: Vec<u8> = (0..BLOB_LEN as u8)
            .map(|i| i.wrapping_mul(seed).wrapping_add(seed))
            .collect();
        if region == DumpRegion::Buttons {
            blob.fill(0);
            blob[0..4].copy_from_slice(&[1, 0xF0, 0, 0]);
            blob[4..8].copy_from_slice(&[1, 0xF1, 0, 0]);
            blob[8..12].copy_from_slice(&[1, 0xF2, 0, 0]);
            // a slot the codec does not know
            blob[40..44].copy_from_slice(&[0xB, 0x40, 0xDE, 0xAD]);
        }
        blob
    }

    /// Create a mock TM155 that answers every command a connecting host uses.
    fn create_mock_tm155() -> MockTransport {
        let mock = MockTransport::new();
        mock.on_get(ids::GET_FIRMWARE_VERSION, NO_ARGS, &[1, 4]);
        mock.on_get(ids::GET_FLAGS, NO_ARGS, &[0xFC]);
        mock.on_get(ids::GET_PROFILE, NO_ARGS, &[PROFILE]);
        mock.on_get(ids::GET_SIDE_LIGHT, NO_ARGS, &[1]);
        mock.on_get(ids::GET_BOOTLOADER_STATE, NO_ARGS, &[0]);
        mock.on_get(ids::GET_DPI_STAGE, [PROFILE, 0, 0, 0, 0, 0], &[PROFILE, 4]);
        mock.on_get(ids::GET_REPORT_RATE, [PROFILE, 0, 0, 0, 0, 0], &[PROFILE, 3]);
        for region in DumpRegion::ALL {
            mock.on_get(region.read_id(), [PROFILE, 0, 0, 0, 0, 0], &[PROFILE, 0x80]);
        }
        mock
    }

    /// Stream a blob in as input reports until the pending read finishes.
    fn deliver(
        reader: &mut BulkReader,
        mock: &MockTransport,
        blob: &[u8],
        pending: &mut PendingRead,
    ) -> Vec<u8> {
        for block in blob.chunks(BLOCK_LEN) {
            assert!(pending.try_take().is_none());
            reader.handle_input_report(mock, block);
        }
        pending.try_take().unwrap().unwrap().data
    }

    /// Test: what a host reads right after connecting.
    #[test]
    fn connect_and_read_state() {
        let mock = create_mock_tm155();

        system::claim_host_control(&mock).unwrap();
        let version = system::read_firmware_version(&mock).unwrap();
        assert_eq!(version.to_string(), "1.4");
        assert_eq!(system::read_flags(&mock).unwrap(), 0xFC);
        assert!(!system::read_bootloader_state(&mock).unwrap());

        let active = profile::read_active_profile(&mock).unwrap();
        assert_eq!(active, PROFILE);
        assert_eq!(dpi::read_dpi_stage(&mock, active).unwrap(), 4);
        assert_eq!(report_rate::read_report_rate(&mock, active).unwrap(), 3);
        assert!(lighting::read_side_light(&mock).unwrap());
    }

    /// Test: config read→modify→write touches only the edited field.
    #[test]
    fn config_read_modify_write() {
        let mock = create_mock_tm155();
        let mut reader = BulkReader::new();
        let stored = stored_blob(DumpRegion::Config);

        let mut pending = config::request_config(&mut reader, &mock, PROFILE).unwrap();
        let data = deliver(&mut reader, &mock, &stored, &mut pending);
        assert!(reader.is_idle());

        let mut blob = ConfigBlob::from_slice(&data).unwrap();
        blob.set_rgb(2, Rgb::new(10, 20, 30)).unwrap();
        blob.set_report_rate_disabled(ReportRate::Hz125, true);

        let pacer = RecordingPacer::default();
        config::write_config(&mock, PROFILE, &blob, &pacer).unwrap();

        let written = mock.output_reports().concat();
        assert_eq!(written.len(), BLOB_LEN);
        for (i, (new, old)) in written.iter().zip(&stored).enumerate() {
            match i {
                0x1E => assert_eq!(*new, 10),
                0x1F => assert_eq!(*new, 20),
                0x20 => assert_eq!(*new, 30),
                0x40 => assert_eq!(*new, old | 0x10),
                _ => assert_eq!(new, old, "byte 0x{i:02X} changed"),
            }
        }
        assert_eq!(pacer.pauses(), vec![bulk::BLOCK_DELAY; 2]);
    }

    /// Test: config and button reads queued together complete in order,
    /// and the button map survives a read→modify→write with unknown slots.
    #[test]
    fn queued_reads_then_button_remap() {
        let mock = create_mock_tm155();
        let mut reader = BulkReader::new();

        let mut config_read = config::request_config(&mut reader, &mock, PROFILE).unwrap();
        let mut buttons_read = buttons::request_button_map(&mut reader, &mock, PROFILE).unwrap();
        assert_eq!(reader.pending(), 2);
        // only the head has been dispatched
        assert_eq!(mock.feature_reports().len(), 1);

        let config_data = deliver(
            &mut reader,
            &mock,
            &stored_blob(DumpRegion::Config),
            &mut config_read,
        );
        assert_eq!(config_data, stored_blob(DumpRegion::Config));
        assert_eq!(mock.feature_reports()[1][0], ids::READ_BUTTONS);

        let stored = stored_blob(DumpRegion::Buttons);
        let button_data = deliver(&mut reader, &mock, &stored, &mut buttons_read);
        let mut map = ButtonMap::from_blob(&button_data).unwrap();
        assert_eq!(map.slot(10).unwrap(), ButtonSlot::Raw([0xB, 0x40, 0xDE, 0xAD]));

        let m1 = PhysicalButton::from_name("M1").unwrap();
        map.set_action(m1.slot, Some(ButtonAction::DpiStage(CycleAdjust::Cycle)))
            .unwrap();
        map.set_action(
            m1.alternate_slot(),
            Some(ButtonAction::Mouse(MouseButton::Button4)),
        )
        .unwrap();
        buttons::write_button_map(&mock, PROFILE, &map, &RecordingPacer::default()).unwrap();

        let written = mock.output_reports().concat();
        let mut expected = stored.clone();
        expected[44..48].copy_from_slice(&[7, 2, 0, 0]);
        expected[108..112].copy_from_slice(&[1, 0xF3, 0, 0]);
        assert_eq!(written, expected);
    }

    /// Test: raw dumps of every region in one queue.
    #[test]
    fn dump_every_region() {
        let mock = create_mock_tm155();
        let mut reader = BulkReader::new();

        let mut pending: Vec<(DumpRegion, PendingRead)> = DumpRegion::ALL
            .iter()
            .map(|&region| (region, bulk::request_blob(&mut reader, &mock, region, PROFILE)))
            .collect();

        for (region, read) in pending.iter_mut() {
            let data = deliver(&mut reader, &mock, &stored_blob(*region), read);
            assert_eq!(data, stored_blob(*region), "{region:?}");
        }
        assert!(reader.is_idle());

        let sent_ids: Vec<u8> = mock.feature_reports().iter().map(|f| f[0]).collect();
        assert_eq!(sent_ids, vec![ids::READ_CONFIG, ids::READ_BUTTONS, ids::READ_EXTRA]);
    }

    /// Test: a failed write never reaches the device.
    #[test]
    fn invalid_writes_are_rejected_before_io() {
        let mock = create_mock_tm155();
        let pacer = RecordingPacer::default();

        assert!(profile::write_active_profile(&mock, 9).is_err());
        assert!(dpi::write_dpi_stage(&mock, PROFILE, 8).is_err());
        assert!(bulk::write_blob(&mock, DumpRegion::Extra, PROFILE, &[0; 100], &pacer).is_err());
        assert!(mock.sent().is_empty());
        assert!(pacer.pauses().is_empty());
    }
}
