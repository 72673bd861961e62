//! Image loading: the length header is authoritative and the file must end
//! exactly where it says.

mod common;

use common::*;
use gaia_core::cpu::{Config, DEFAULT_ENTRY_POINT};
use gaia_core::emu::Emu;
use gaia_core::exception::Exception;
use gaia_core::loader::LoaderError;
use std::io::Write;
use tempfile::NamedTempFile;

fn image_file(declared: u32, payload: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&declared.to_le_bytes()).unwrap();
    file.write_all(payload).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn a_valid_image_lands_at_the_entry_point() {
    let words = [ldl(1, 5), HALT];
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    let file = image_file(bytes.len() as u32, &bytes);

    let mut emu = Emu::new(Config::default());
    emu.load_image(file.path()).unwrap();
    assert_eq!(emu.machine.mem.read_word(DEFAULT_ENTRY_POINT), ldl(1, 5));

    emu.run().unwrap();
    assert_eq!(emu.machine.regs.read(1), 5);
}

#[test]
fn a_file_shorter_than_its_header_is_rejected() {
    let file = image_file(8, &[0xaa; 4]);
    let mut emu = Emu::new(Config::default());
    let err = emu.load_image(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Exception::Loader(LoaderError::TooShort)
    ));
    assert!(err.to_string().contains("reached EOF"));
}

#[test]
fn trailing_bytes_are_rejected() {
    let file = image_file(4, &[0xaa; 8]);
    let mut emu = Emu::new(Config::default());
    let err = emu.load_image(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Exception::Loader(LoaderError::TrailingBytes)
    ));
}

#[test]
fn a_missing_file_is_an_io_error() {
    let mut emu = Emu::new(Config::default());
    let err = emu
        .load_image(std::path::Path::new("/no/such/image.bin"))
        .unwrap_err();
    assert!(matches!(err, Exception::Loader(LoaderError::Io(_))));
}

#[test]
fn an_image_larger_than_ram_is_rejected() {
    let payload = vec![0u8; 0x2000];
    let file = image_file(payload.len() as u32, &payload);
    let config = Config {
        mem_size: 0x1000,
        entry_point: 0,
        ..Config::default()
    };
    let mut emu = Emu::new(config);
    let err = emu.load_image(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Exception::Loader(LoaderError::TooLarge { .. })
    ));
}
