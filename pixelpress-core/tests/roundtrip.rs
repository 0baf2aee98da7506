use pixelpress_core::filters::{choose_filter, FilterType, Heuristic};
use pixelpress_core::image::Image;
use pixelpress_core::lz77::Lz77Parser;
use pixelpress_core::pipeline::{BackEnd, PipelineDriver};
use pixelpress_core::{lz_arithmetic, BitBuffer};

#[test]
fn all_zero_scanline_short_circuits_to_none() {
    let (filter, residual) = choose_filter(Heuristic::AbsoluteSum, &[0, 0, 0], &[5, 5, 5]);
    assert_eq!(filter, FilterType::None);
    assert_eq!(residual, vec![0, 0, 0]);
}

#[test]
fn constant_scanline_with_zero_prev_picks_sub() {
    let (filter, residual) = choose_filter(Heuristic::AbsoluteSum, &[1, 1, 1, 1], &[0, 0, 0, 0]);
    assert_eq!(filter, FilterType::Sub);
    assert_eq!(residual, vec![1, 0, 0, 0]);
}

#[test]
fn repeated_scanline_picks_none_then_up() {
    let row0 = [255u8, 255, 255];
    let zero_prev = [0u8, 0, 0];
    let (filter0, _) = choose_filter(Heuristic::AbsoluteSum, &row0, &zero_prev);
    assert_eq!(filter0, FilterType::None);

    let (filter1, residual1) = choose_filter(Heuristic::AbsoluteSum, &row0, &row0);
    assert_eq!(filter1, FilterType::Up);
    assert_eq!(residual1, vec![0, 0, 0]);
}

#[test]
fn average_filter_zeroes_a_matching_midpoint_residual() {
    let curr = [4u8, 10, 30];
    let prev = [8u8, 16, 50];
    let (filter, residual) = choose_filter(Heuristic::AbsoluteSum, &curr, &prev);
    assert_eq!(filter, FilterType::Average);
    assert_eq!(residual, vec![0, 0, 0]);
}

#[test]
fn rgba_two_by_two_round_trips_through_order0_arithmetic() {
    let driver = PipelineDriver::new(2, 2).with_back_end(BackEnd::Arithmetic(0));
    let channels = vec![vec![1u8; 4], vec![2u8; 4], vec![3u8; 4], vec![4u8; 4]];
    let image = Image::new(2, 2, channels).unwrap();

    let encoded = driver.encode_image(&image).unwrap();
    let decoded = driver.decode_image(&encoded).unwrap();

    assert_eq!(decoded, image);
}

#[test]
fn lz_arithmetic_on_run_of_as_yields_one_literal_then_a_long_match() {
    let data = b"AAAAAAAAAA";
    let parser = Lz77Parser::new();
    let (sequences, literals) = parser.parse(data);

    assert_eq!(literals, vec![b'A']);
    assert!(sequences.len() >= 2);
    assert_eq!(sequences[0].literal_count, 1);
    assert!(sequences[0].match_length == 0 || sequences[0].match_length >= parser.min_match());

    let encoded = lz_arithmetic::encode(data).unwrap();
    let decoded = lz_arithmetic::decode(&encoded).unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn framing_length_prefix_matches_the_segment_it_bounds() {
    let driver = PipelineDriver::new(3, 2).with_prepend_filter_type(true).with_back_end(BackEnd::Deflate);
    let channels: Vec<Vec<u8>> = (0..3).map(|c| (0..6).map(|i| ((i + c) % 5) as u8).collect()).collect();
    let image = Image::new(3, 2, channels).unwrap();

    let encoded = driver.encode_image(&image).unwrap();
    let decoded = driver.decode_image(&encoded).unwrap();
    assert_eq!(decoded, image);

    let mut cursor = encoded.cursor();
    let len_w = cursor.read_uint(32).unwrap();
    cursor.skip(len_w).unwrap();
    let len_h = cursor.read_uint(32).unwrap();
    cursor.skip(len_h).unwrap();
    let channel_count = cursor.read_uint(8).unwrap();
    assert_eq!(channel_count, 3);

    for _ in 0..channel_count {
        let channel_bit_len = cursor.read_uint(32).unwrap();
        let start = cursor.position();
        cursor.skip(channel_bit_len).unwrap();
        assert_eq!(cursor.position() - start, channel_bit_len);
    }
    assert_eq!(cursor.remaining(), 0);
}

#[test]
fn empty_literal_buffer_is_exactly_32_zero_bits() {
    let encoded = lz_arithmetic::encode(&[]).unwrap();
    let decoded = lz_arithmetic::decode(&encoded).unwrap();
    assert!(decoded.is_empty());

    let empty = BitBuffer::new();
    assert_eq!(empty.len(), 0);
}
