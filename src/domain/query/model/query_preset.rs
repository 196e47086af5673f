use serde::Serialize;

/// Named example query offered by the terminal.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueryPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub code: &'static str,
}

pub const QUERY_PRESETS: &[QueryPreset] = &[
    QueryPreset {
        name: "Get All Users (limit 50)",
        description: "Basic collection query with limit",
        code: r#"// Fetch first 50 users
const snapshot = await getDocs(
  query(collection(db, 'users'), limit(50))
);
return snapshot;"#,
    },
    QueryPreset {
        name: "Query with Where Clause",
        description: "Filter documents with conditions",
        code: r#"// Find admin users (nested field)
const snapshot = await getDocs(
  query(
    collection(db, 'users'),
    where('roles.admin', '==', true)
  )
);
return snapshot;"#,
    },
    QueryPreset {
        name: "Order By + Limit",
        description: "Sort and limit results",
        code: r#"// Get 20 most recent bookings
const snapshot = await getDocs(
  query(
    collection(db, 'bookings'),
    orderBy('createdAt', 'desc'),
    limit(20)
  )
);
return snapshot;"#,
    },
    QueryPreset {
        name: "Multiple Where Conditions",
        description: "Compound queries with multiple filters",
        code: r#"// Find pending enquiries from today
const today = new Date();
today.setHours(0, 0, 0, 0);

const snapshot = await getDocs(
  query(
    collection(db, 'enquiries'),
    where('status', '==', 'pending'),
    where('createdAt', '>=', Timestamp.fromDate(today))
  )
);
return snapshot;"#,
    },
    QueryPreset {
        name: "Get Single Document",
        description: "Fetch a single document by ID",
        code: r#"// Get a specific document by ID
const docId = 'YOUR_DOCUMENT_ID';
const docSnap = await getDoc(doc(db, 'users', docId));

if (docSnap.exists()) {
  return { id: docSnap.id, ...docSnap.data() };
} else {
  throw new Error('Document not found');
}"#,
    },
    QueryPreset {
        name: "Count Documents",
        description: "Get document count",
        code: r#"// Count all documents in a collection
const snapshot = await getDocs(collection(db, 'users'));
console.log('Total users:', snapshot.size);
return snapshot;"#,
    },
    QueryPreset {
        name: "Nested Collection Query",
        description: "Access subcollections",
        code: r#"// Query a subcollection
const userId = 'USER_ID_HERE';
const snapshot = await getDocs(
  collection(db, 'users', userId, 'mentorProgram')
);
return snapshot;"#,
    },
    QueryPreset {
        name: "Range Query",
        description: "Query with range conditions",
        code: r#"// Find users within age range
const snapshot = await getDocs(
  query(
    collection(db, 'users'),
    where('age', '>=', 18),
    where('age', '<=', 30),
    orderBy('age'),
    limit(50)
  )
);
return snapshot;"#,
    },
    QueryPreset {
        name: "Mentor/Mentee Profile Information",
        description: "Get all mentor/mentee profile data from nested collections",
        code: r#"// Collate all mentor profiles from users
const allProfiles = [];
const usersSnap = await getDocs(collection(db, 'users'));

for (const userDoc of usersSnap.docs) {
  const userId = userDoc.id;
  try {
    const profileDoc = await getDoc(doc(db, 'users', userId, 'mentorProgram', 'profile'));
    if (profileDoc.exists()) {
      allProfiles.push({
        ...profileDoc.data(),
        _userId: userId,
        _path: `users/${userId}/mentorProgram/profile`
      });
    }
  } catch (error) {
    // users without a mentor profile are skipped
  }
}

console.log(`Found ${allProfiles.length} mentor profiles`);
return allProfiles;"#,
    },
];
