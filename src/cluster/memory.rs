//! Thread-safe in-memory [`ObjectStore`] implementation for local development and tests.

// crates.io
use rand::Rng;
use tokio::sync::broadcast::{self, Receiver, Sender};
// self
use crate::{
	_prelude::*,
	api::{LabelSelector, ObjectKey, Resource},
	cluster::{ClusterError, ClusterFuture, ObjectStore, WatchEvent},
};

const WATCH_CAPACITY: usize = 256;
const NAME_SUFFIX_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";
const NAME_SUFFIX_LEN: usize = 5;

struct Objects<K> {
	items: BTreeMap<ObjectKey, K>,
	version: u64,
}
impl<K> Objects<K> {
	fn next_version(&mut self) -> u64 {
		self.version += 1;

		self.version
	}
}

struct Inner<K> {
	objects: RwLock<Objects<K>>,
	events: Sender<WatchEvent<K>>,
}

/// Thread-safe object store that keeps resources in-process for tests and demos.
pub struct MemoryObjectStore<K>(Arc<Inner<K>>);
impl<K> MemoryObjectStore<K>
where
	K: Resource,
{
	/// Creates an empty store.
	pub fn new() -> Self {
		let (events, _) = broadcast::channel(WATCH_CAPACITY);

		Self(Arc::new(Inner {
			objects: RwLock::new(Objects { items: BTreeMap::new(), version: 0 }),
			events,
		}))
	}

	/// Number of stored objects, including those pending deletion.
	pub fn len(&self) -> usize {
		self.0.objects.read().items.len()
	}

	/// Returns true when the store holds nothing.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn publish(&self, event: WatchEvent<K>) {
		// No subscribers is not an error.
		let _ = self.0.events.send(event);
	}

	fn generate_name(prefix: &str) -> String {
		let mut rng = rand::rng();
		let suffix = (0..NAME_SUFFIX_LEN)
			.map(|_| NAME_SUFFIX_ALPHABET[rng.random_range(0..NAME_SUFFIX_ALPHABET.len())] as char)
			.collect::<String>();

		format!("{prefix}{suffix}")
	}

	fn check_version(stored: &K, incoming: &K) -> Result<(), ClusterError> {
		let expected = incoming.meta().resource_version;
		let actual = stored.meta().resource_version;

		// Version zero means an unconditional write.
		if expected != 0 && expected != actual {
			return Err(ClusterError::Conflict {
				kind: K::KIND,
				key: stored.key().to_string(),
				expected,
				actual,
			});
		}

		Ok(())
	}

	fn create_now(&self, mut object: K) -> Result<K, ClusterError> {
		let mut objects = self.0.objects.write();
		let meta = object.meta_mut();

		if meta.namespace.is_empty() {
			return Err(ClusterError::Invalid {
				kind: K::KIND,
				message: "namespace is required".into(),
			});
		}
		if meta.name.is_empty() {
			if meta.generate_name.is_empty() {
				return Err(ClusterError::Invalid {
					kind: K::KIND,
					message: "name or generateName is required".into(),
				});
			}

			loop {
				let candidate = Self::generate_name(&meta.generate_name);

				if !objects.items.contains_key(&ObjectKey::new(&meta.namespace, &candidate)) {
					meta.name = candidate;

					break;
				}
			}
		}

		let key = meta.key();

		if objects.items.contains_key(&key) {
			return Err(ClusterError::AlreadyExists { kind: K::KIND, key: key.to_string() });
		}

		meta.uid = uuid::Uuid::new_v4().to_string();
		meta.resource_version = objects.next_version();
		meta.creation_timestamp = Some(OffsetDateTime::now_utc());
		meta.deletion_timestamp = None;

		objects.items.insert(key, object.clone());
		drop(objects);
		self.publish(WatchEvent::Applied(object.clone()));

		Ok(object)
	}

	fn update_now(&self, mut object: K) -> Result<K, ClusterError> {
		let key = object.key();
		let mut objects = self.0.objects.write();
		let Some(stored) = objects.items.get(&key) else {
			return Err(ClusterError::NotFound { kind: K::KIND, key: key.to_string() });
		};

		Self::check_version(stored, &object)?;

		let stored_meta = stored.meta();
		let status = stored.status().clone();

		{
			let meta = object.meta_mut();

			meta.uid = stored_meta.uid.clone();
			meta.generate_name = stored_meta.generate_name.clone();
			meta.creation_timestamp = stored_meta.creation_timestamp;
			meta.deletion_timestamp = stored_meta.deletion_timestamp;
		}
		*object.status_mut() = status;

		if object.is_deleting() && object.meta().finalizers.is_empty() {
			objects.items.remove(&key);
			drop(objects);
			self.publish(WatchEvent::Deleted(object.clone()));

			return Ok(object);
		}

		object.meta_mut().resource_version = objects.next_version();
		objects.items.insert(key, object.clone());
		drop(objects);
		self.publish(WatchEvent::Applied(object.clone()));

		Ok(object)
	}

	fn update_status_now(&self, object: K) -> Result<K, ClusterError> {
		let key = object.key();
		let mut objects = self.0.objects.write();
		let Some(stored) = objects.items.get(&key) else {
			return Err(ClusterError::NotFound { kind: K::KIND, key: key.to_string() });
		};

		Self::check_version(stored, &object)?;

		if stored.status() == object.status() {
			return Ok(stored.clone());
		}

		let mut updated = stored.clone();

		*updated.status_mut() = object.status().clone();
		updated.meta_mut().resource_version = objects.next_version();
		objects.items.insert(key, updated.clone());
		drop(objects);
		self.publish(WatchEvent::Applied(updated.clone()));

		Ok(updated)
	}

	fn delete_now(&self, key: &ObjectKey) -> Result<(), ClusterError> {
		let mut objects = self.0.objects.write();
		let Some(stored) = objects.items.get(key) else {
			return Err(ClusterError::NotFound { kind: K::KIND, key: key.to_string() });
		};

		if stored.meta().finalizers.is_empty() {
			let removed = objects.items.remove(key);

			drop(objects);

			if let Some(removed) = removed {
				self.publish(WatchEvent::Deleted(removed));
			}

			return Ok(());
		}
		if stored.is_deleting() {
			return Ok(());
		}

		let mut marked = stored.clone();

		marked.meta_mut().deletion_timestamp = Some(OffsetDateTime::now_utc());
		marked.meta_mut().resource_version = objects.next_version();
		objects.items.insert(key.clone(), marked.clone());
		drop(objects);
		self.publish(WatchEvent::Applied(marked));

		Ok(())
	}
}
impl<K> ObjectStore<K> for MemoryObjectStore<K>
where
	K: Resource,
{
	fn get<'a>(&'a self, key: &'a ObjectKey) -> ClusterFuture<'a, Option<K>> {
		let object = self.0.objects.read().items.get(key).cloned();

		Box::pin(async move { Ok(object) })
	}

	fn list<'a>(
		&'a self,
		namespace: Option<&'a str>,
		selector: &'a LabelSelector,
	) -> ClusterFuture<'a, Vec<K>> {
		let objects = self
			.0
			.objects
			.read()
			.items
			.values()
			.filter(|o| namespace.is_none_or(|ns| o.meta().namespace == ns))
			.filter(|o| selector.matches(&o.meta().labels))
			.cloned()
			.collect();

		Box::pin(async move { Ok(objects) })
	}

	fn create(&self, object: K) -> ClusterFuture<'_, K> {
		Box::pin(async move { self.create_now(object) })
	}

	fn update(&self, object: K) -> ClusterFuture<'_, K> {
		Box::pin(async move { self.update_now(object) })
	}

	fn update_status(&self, object: K) -> ClusterFuture<'_, K> {
		Box::pin(async move { self.update_status_now(object) })
	}

	fn delete<'a>(&'a self, key: &'a ObjectKey) -> ClusterFuture<'a, ()> {
		Box::pin(async move { self.delete_now(key) })
	}

	fn watch(&self) -> Receiver<WatchEvent<K>> {
		self.0.events.subscribe()
	}
}
impl<K> Clone for MemoryObjectStore<K> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}
impl<K> Default for MemoryObjectStore<K>
where
	K: Resource,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K> Debug for MemoryObjectStore<K>
where
	K: Resource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryObjectStore")
			.field("kind", &K::KIND)
			.field("len", &self.len())
			.finish()
	}
}
