use std::{error::Error, sync::Arc};

use zarrs_lite::{
    array::{ArrayBuilder, ArrayError, ArrayOrder, DataType, Endianness, FillValue},
    array_subset::ArraySubset,
    hierarchy::Hierarchy,
    metadata::{Attributes, CompressorMetadata, ZarrVersion},
    storage::{
        store::{FilesystemStore, MemoryStore},
        ListableStorageTraits, ReadableStorageTraits, ReadableWritableListableStorageTraits,
        StoreKey,
    },
};

fn gzip(level: u32) -> CompressorMetadata {
    let mut configuration = serde_json::Map::new();
    configuration.insert("level".to_string(), level.into());
    CompressorMetadata::new("gzip", configuration)
}

fn dent_attributes() -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert("question".to_string(), "life".into());
    attributes.insert("answer".to_string(), 42.into());
    attributes
}

fn dent_builder() -> ArrayBuilder {
    let mut builder = ArrayBuilder::new(
        vec![4, 4],
        DataType::Float64,
        vec![2, 2],
        FillValue::from(6.6f64),
    );
    #[cfg(feature = "gzip")]
    builder.compressor(Some(gzip(1)));
    builder.attributes(dent_attributes());
    builder
}

fn write_read_element<TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static>(
    store: Arc<TStorage>,
    version: ZarrVersion,
) -> Result<(), Box<dyn Error>> {
    let hierarchy = Hierarchy::create(store.clone(), version)?;
    let array = hierarchy.create_array("/arthur/dent", &dent_builder())?;
    array.store_array_subset_elements::<f64>(
        &ArraySubset::new_with_start_shape(vec![2, 1], vec![1, 1])?,
        &[3.0],
    )?;

    // Reopen from the store alone
    let hierarchy = Hierarchy::open(store.clone())?;
    assert_eq!(hierarchy.version(), version);
    let array = hierarchy.get_array("/arthur/dent")?;
    assert_eq!(array.attributes(), &dent_attributes());
    let elements =
        array.retrieve_array_subset_elements::<f64>(&ArraySubset::new_with_shape(vec![4, 4]))?;
    let mut expected = vec![6.6; 16];
    expected[2 * 4 + 1] = 3.0;
    assert_eq!(elements, expected);

    // Only the touched chunk is stored
    let chunk_keys: Vec<StoreKey> = store
        .list()?
        .into_iter()
        .filter(|key| !key.as_str().ends_with(".json") && !key.name().starts_with(".z"))
        .collect();
    assert_eq!(chunk_keys, vec![array.chunk_key(&[1, 0])]);
    match version {
        ZarrVersion::V2 => assert_eq!(array.chunk_key(&[1, 0]).as_str(), "arthur/dent/1.0"),
        ZarrVersion::V3 => assert_eq!(array.chunk_key(&[1, 0]).as_str(), "data/root/arthur/dent/c1/0"),
    }
    Ok(())
}

#[test]
fn round_trip_memory() -> Result<(), Box<dyn Error>> {
    write_read_element(Arc::new(MemoryStore::new()), ZarrVersion::V2)?;
    write_read_element(Arc::new(MemoryStore::new()), ZarrVersion::V3)?;
    Ok(())
}

#[test]
fn round_trip_filesystem() -> Result<(), Box<dyn Error>> {
    for version in [ZarrVersion::V2, ZarrVersion::V3] {
        let path = tempfile::TempDir::new()?;
        write_read_element(Arc::new(FilesystemStore::new(path.path())?), version)?;
        match version {
            ZarrVersion::V2 => {
                assert!(path.path().join(".zgroup").is_file());
                assert!(path.path().join("arthur/dent/.zarray").is_file());
                assert!(path.path().join("arthur/dent/.zattrs").is_file());
            }
            ZarrVersion::V3 => {
                assert!(path.path().join("zarr.json").is_file());
                assert!(path.path().join("meta/root/arthur/dent.array.json").is_file());
                assert!(path.path().join("data/root/arthur/dent/c1/0").is_file());
            }
        }
    }
    Ok(())
}

#[test]
fn round_trip_boundary_chunks() -> Result<(), Box<dyn Error>> {
    for version in [ZarrVersion::V2, ZarrVersion::V3] {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store, version)?;
        let builder = ArrayBuilder::new(vec![5, 10], DataType::Int32, vec![2, 5], FillValue::from(-1i32));
        let array = hierarchy.create_array("/boundary", &builder)?;
        assert_eq!(array.chunk_grid_shape(), vec![3, 2]);

        let elements: Vec<i32> = (0..50).collect();
        let all = ArraySubset::new_with_shape(vec![5, 10]);
        array.store_array_subset_elements(&all, &elements)?;
        assert_eq!(array.retrieve_array_subset_elements::<i32>(&all)?, elements);

        // The last chunk row extends beyond the array
        let chunk = array.retrieve_chunk_elements::<i32>(&[2, 1])?;
        assert_eq!(&chunk[..5], &[45, 46, 47, 48, 49]);
        assert_eq!(&chunk[5..], &[-1; 5]);

        assert!(matches!(
            array.retrieve_array_subset(&ArraySubset::new_with_start_shape(vec![4, 0], vec![2, 1])?),
            Err(ArrayError::OutOfBounds { .. })
        ));
    }
    Ok(())
}

#[test]
fn round_trip_boundary_rows_then_head() -> Result<(), Box<dyn Error>> {
    for version in [ZarrVersion::V2, ZarrVersion::V3] {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store, version)?;
        let builder = ArrayBuilder::new(vec![5, 10], DataType::Int32, vec![2, 5], FillValue::from(-1i32));
        let array = hierarchy.create_array("/boundary", &builder)?;

        // Rows [4, 5) only cover half of the last chunk row
        let tail = ArraySubset::new_with_ranges(&[4..5, 0..10]);
        let tail_elements: Vec<i32> = (40..50).collect();
        array.store_array_subset_elements(&tail, &tail_elements)?;

        let head = ArraySubset::new_with_ranges(&[0..2, 0..10]);
        let head_elements: Vec<i32> = (0..20).collect();
        array.store_array_subset_elements(&head, &head_elements)?;

        assert_eq!(array.retrieve_array_subset_elements::<i32>(&tail)?, tail_elements);
        assert_eq!(array.retrieve_array_subset_elements::<i32>(&head)?, head_elements);
        assert_eq!(
            array.retrieve_array_subset_elements::<i32>(&ArraySubset::new_with_ranges(&[2..4, 0..10]))?,
            vec![-1; 20]
        );
        // The part of the last chunk row beyond the array keeps the fill value
        assert_eq!(array.retrieve_chunk_elements::<i32>(&[2, 0])?[5..], [-1; 5]);
    }
    Ok(())
}

#[test]
fn round_trip_disjoint_regions_in_absent_chunk() -> Result<(), Box<dyn Error>> {
    for version in [ZarrVersion::V2, ZarrVersion::V3] {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store.clone(), version)?;
        let builder = ArrayBuilder::new(vec![8, 8], DataType::UInt8, vec![4, 4], FillValue::from(9u8));
        let array = hierarchy.create_array("/disjoint", &builder)?;
        assert!(store.get(&array.chunk_key(&[0, 0]))?.is_none());

        array.store_array_subset_elements::<u8>(&ArraySubset::new_with_ranges(&[0..1, 0..2]), &[1, 2])?;
        array.store_array_subset_elements::<u8>(&ArraySubset::new_with_ranges(&[2..4, 3..4]), &[3, 4])?;

        #[rustfmt::skip]
        let expected = vec![
            1, 2, 9, 9,
            9, 9, 9, 9,
            9, 9, 9, 3,
            9, 9, 9, 4,
        ];
        assert_eq!(array.retrieve_chunk_elements::<u8>(&[0, 0])?, expected);
        assert!(store.get(&array.chunk_key(&[0, 1]))?.is_none());
        assert_eq!(
            array.retrieve_array_subset_elements::<u8>(&ArraySubset::new_with_ranges(&[0..4, 4..8]))?,
            vec![9; 16]
        );
    }
    Ok(())
}

#[test]
fn round_trip_partial_chunk_writes()-> Result<(), Box<dyn Error>> {
    for version in [ZarrVersion::V2, ZarrVersion::V3] {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store, version)?;
        let builder = ArrayBuilder::new(vec![6, 6], DataType::UInt16, vec![4, 4], FillValue::from(0u16));
        let array = hierarchy.create_array("/partial", &builder)?;

        let all = ArraySubset::new_with_shape(vec![6, 6]);
        let elements: Vec<u16> = (1..=36).collect();
        array.store_array_subset_elements(&all, &elements)?;

        // Overwrite a region straddling all four chunks
        let region = ArraySubset::new_with_start_shape(vec![3, 3], vec![2, 2])?;
        array.store_array_subset_elements::<u16>(&region, &[100, 101, 102, 103])?;

        let mut expected = elements.clone();
        for (i, j, value) in [(3, 3, 100), (3, 4, 101), (4, 3, 102), (4, 4, 103)] {
            expected[i * 6 + j] = value;
        }
        assert_eq!(array.retrieve_array_subset_elements::<u16>(&all)?, expected);
        assert_eq!(
            array.retrieve_array_subset_elements::<u16>(&region)?,
            vec![100, 101, 102, 103]
        );
    }
    Ok(())
}

#[test]
fn round_trip_byte_order_and_layout() -> Result<(), Box<dyn Error>> {
    for order in [ArrayOrder::C, ArrayOrder::F] {
        for endianness in [Endianness::Little, Endianness::Big] {
            let store = Arc::new(MemoryStore::new());
            let hierarchy = Hierarchy::create(store, ZarrVersion::V2)?;
            let mut builder = ArrayBuilder::new(
                vec![3, 5],
                zarrs_lite::array::Dtype::new(DataType::Float32, endianness),
                vec![2, 3],
                FillValue::from(0.5f32),
            );
            builder.order(order);
            let array = hierarchy.create_array("/layout", &builder)?;
            let all = ArraySubset::new_with_shape(vec![3, 5]);
            #[allow(clippy::cast_precision_loss)]
            let elements: Vec<f32> = (0..15).map(|i| i as f32).collect();
            array.store_array_subset_elements(&all, &elements)?;

            let reopened = Hierarchy::open(hierarchy.storage().clone())?.get_array("/layout")?;
            assert_eq!(reopened.order(), order);
            assert_eq!(reopened.retrieve_array_subset_elements::<f32>(&all)?, elements);
        }
    }
    Ok(())
}

#[cfg(feature = "gzip")]
#[test]
fn metadata_fidelity() -> Result<(), Box<dyn Error>> {
    for version in [ZarrVersion::V2, ZarrVersion::V3] {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store.clone(), version)?;
        let mut builder = dent_builder();
        builder.compressor(Some(gzip(1)));
        let array = hierarchy.create_array("/arthur/dent", &builder)?;

        let reopened = Hierarchy::open(store)?.get_array("/arthur/dent")?;
        assert_eq!(reopened.metadata(), array.metadata());
        assert_eq!(reopened.compressor(), Some(&gzip(1)));
        assert_ne!(reopened.compressor(), Some(&gzip(2)));
        assert_eq!(reopened.fill_value(), &FillValue::from(6.6f64));
    }
    Ok(())
}

#[test]
fn attributes_independent_of_data() -> Result<(), Box<dyn Error>> {
    for version in [ZarrVersion::V2, ZarrVersion::V3] {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store.clone(), version)?;
        let mut array = hierarchy.create_array("/arthur/dent", &dent_builder())?;
        array.store_chunk_elements::<f64>(&[0, 0], &[1.0, 2.0, 3.0, 4.0])?;
        let chunk_key = array.chunk_key(&[0, 0]);
        let chunk_before = store.get(&chunk_key)?;

        let mut attributes = Attributes::new();
        attributes.insert("towel".to_string(), true.into());
        array.set_attributes(attributes.clone())?;

        assert_eq!(store.get(&chunk_key)?, chunk_before);
        let reopened = hierarchy.get_array("/arthur/dent")?;
        assert_eq!(reopened.attributes(), &attributes);
        assert_eq!(
            reopened.retrieve_chunk_elements::<f64>(&[0, 0])?,
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }
    Ok(())
}

#[cfg(feature = "ndarray")]
#[test]
fn round_trip_ndarray() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    let hierarchy = Hierarchy::create(store, ZarrVersion::V3)?;
    let array = hierarchy.create_array("/arthur/dent", &dent_builder())?;

    let update = ndarray::array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
    array.store_array_subset_ndarray(&[1, 1], update.clone())?;

    let region = ArraySubset::new_with_start_shape(vec![1, 1], vec![2, 3])?;
    let retrieved = array.retrieve_array_subset_ndarray::<f64>(&region)?;
    assert_eq!(retrieved, update.into_dyn());

    let all = array.retrieve_array_subset_ndarray::<f64>(&ArraySubset::new_with_shape(vec![4, 4]))?;
    assert_eq!(all[[0, 0]], 6.6);
    assert_eq!(all[[2, 3]], 6.0);
    Ok(())
}
