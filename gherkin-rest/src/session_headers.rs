use crate::{data::Fields, rest_module::RestModule};
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// Headers sent with every request of a scenario.
///
/// Names compare ASCII case-insensitively; re-setting a header keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionHeaders {
    headers: Fields,
}

impl SessionHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<S1: Into<String>, S2: Into<String>>(&mut self, name: S1, value: S2) {
        let name = name.into();
        let value = value.into();

        match self.position(&name) {
            Some(index) => {
                if let Some((_, existing)) = self.headers.get_index_mut(index) {
                    *existing = value;
                }
            }
            None => {
                self.headers.insert(name, value);
            }
        }
    }

    pub fn remove<S: AsRef<str>>(&mut self, name: S) -> Option<String> {
        let index = self.position(name.as_ref())?;
        self.headers.shift_remove_index(index).map(|(_, value)| value)
    }

    pub fn get<S: AsRef<str>>(&self, name: S) -> Option<&str> {
        let index = self.position(name.as_ref())?;
        self.headers.get_index(index).map(|(_, value)| value.as_str())
    }

    pub fn contains<S: AsRef<str>>(&self, name: S) -> bool {
        self.position(name.as_ref()).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers
            .keys()
            .position(|key| key.eq_ignore_ascii_case(name))
    }
}

impl<'a> IntoIterator for &'a SessionHeaders {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

/// Headers applied to a [`RestModule`] for the lifetime of the guard.
///
/// Dropping the guard puts every scoped name back the way it was: the old
/// value when there was one, removed otherwise. This runs on early returns
/// and while unwinding, so a failed call never leaks its headers.
pub struct ScopedHeaders<'a, C: RestModule + ?Sized> {
    client: &'a mut C,
    previous: Vec<(String, Option<String>)>,
}

impl<'a, C: RestModule + ?Sized> ScopedHeaders<'a, C> {
    /// A guard with nothing scoped yet; see [`ScopedHeaders::push`].
    pub fn new(client: &'a mut C) -> Self {
        Self {
            client,
            previous: Vec::new(),
        }
    }

    pub fn apply<'h, I>(client: &'a mut C, headers: I) -> Self
    where
        I: IntoIterator<Item = (&'h String, &'h String)>,
    {
        let mut scoped = Self::new(client);

        for (name, value) in headers {
            scoped.push(name, value);
        }

        scoped
    }

    /// Scopes one more header on top of the ones already applied.
    pub fn push<S1: AsRef<str>, S2: AsRef<str>>(&mut self, name: S1, value: S2) {
        let name = name.as_ref();
        let previous = self.client.session_headers().get(name).map(String::from);

        debug!(header = name, "scoping request header");
        self.previous.push((name.to_string(), previous));
        self.client.have_http_header(name, value.as_ref());
    }
}

impl<'a, C: RestModule + ?Sized> Deref for ScopedHeaders<'a, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.client
    }
}

impl<'a, C: RestModule + ?Sized> DerefMut for ScopedHeaders<'a, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.client
    }
}

impl<'a, C: RestModule + ?Sized> Drop for ScopedHeaders<'a, C> {
    fn drop(&mut self) {
        while let Some((name, previous)) = self.previous.pop() {
            match previous {
                Some(value) => self.client.have_http_header(&name, &value),
                None => self.client.unset_http_header(&name),
            }
        }
        debug!("request headers retracted");
    }
}

/// Runs `call` with `headers` applied, then retracts them whatever the outcome.
pub fn with_scoped_headers<C, F, T>(client: &mut C, headers: &Fields, call: F) -> T
where
    C: RestModule + ?Sized,
    F: FnOnce(&mut C) -> T,
{
    let mut scoped = ScopedHeaders::apply(client, headers);
    let result = call(&mut *scoped);
    drop(scoped);
    result
}
